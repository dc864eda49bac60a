//! Rendering of slip snapshots into outbound messages.
//!
//! # Responsibility
//! - Build the subject, HTML body and plain-text body for a slip
//!   notification from its joined snapshot.
//!
//! # Invariants
//! - Rendering is pure: same snapshot, same output.
//! - The recurrence section is derived from the read-time slip count,
//!   never from stored state.

use crate::notify::channel::OutboundMessage;
use crate::repo::slip_repo::SlipSnapshot;

const DISPLAY_DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const NORMATIVE_NOTE: &str = "De conformidad con el Art\u{ed}culo 46 de la Normatividad para el \
Ejercicio del Gasto y Control Presupuestal vigente, los expedientes con observaciones no podr\u{e1}n \
continuar su flujo hasta que \u{e9}stas hayan sido solventadas ante la DECP; las observaciones \
deber\u{e1}n ser solventadas en un plazo m\u{e1}ximo de 2 d\u{ed}as h\u{e1}biles posteriores a la \
fecha de emisi\u{f3}n del volante, salvo en periodo de cierre, en el que la solventaci\u{f3}n \
deber\u{e1} ser el mismo d\u{ed}a.";

/// Builds the complete outbound message for a slip notification.
pub fn render_notification(
    snapshot: &SlipSnapshot,
    to: &str,
    cc: &[String],
) -> OutboundMessage {
    OutboundMessage {
        to: to.to_string(),
        cc: cc.to_vec(),
        subject: render_subject(snapshot),
        html_body: render_html(snapshot),
        text_body: render_text(snapshot),
        attachments: Vec::new(),
    }
}

/// Subject line carrying the folio.
pub fn render_subject(snapshot: &SlipSnapshot) -> String {
    format!(
        "Notificaci\u{f3}n de Volante de Observaciones: {}",
        snapshot.folio
    )
}

fn render_text(snapshot: &SlipSnapshot) -> String {
    format!(
        "Se ha generado el volante de observaciones {} para el tr\u{e1}mite {}. \
         Fecha l\u{ed}mite de solventaci\u{f3}n: {}. \
         Por favor ponerse en contacto con la DECP.",
        snapshot.folio,
        snapshot.case_number,
        snapshot.deadline.format(DISPLAY_DATETIME_FMT)
    )
}

fn render_html(snapshot: &SlipSnapshot) -> String {
    let recurrence_section = if snapshot.is_recurrence() {
        format!(
            "Reincidencia: <strong>Si</strong> ({} volantes emitidos para la instituci\u{f3}n)",
            snapshot.case_slip_count
        )
    } else {
        "Reincidencia: <strong>No</strong>".to_string()
    };

    let signature_line = match &snapshot.auth_signature {
        Some(signature) => format!(
            "<strong>{}</strong>: <strong>{}</strong>",
            html_escape(signature),
            snapshot.status
        ),
        None => format!("<strong>Estatus</strong>: <strong>{}</strong>", snapshot.status),
    };

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"es\">\n\
         <body>\n\
         <h2>Tesorer\u{ed}a Municipal &mdash; Volante de Observaciones</h2>\n\
         <p>\n\
         <strong>Instituci\u{f3}n:</strong> {department}<br/>\n\
         <strong>Folio Volante:</strong> {folio}<br/>\n\
         <strong>Fecha de Emisi\u{f3}n:</strong> {issued_at}<br/>\n\
         <strong>Fecha L\u{ed}mite de Solventaci\u{f3}n:</strong> {deadline}\n\
         </p>\n\
         <table border=\"1\" cellpadding=\"6\">\n\
         <tr><th>ID</th><th>Tr\u{e1}mite</th><th>Beneficiario</th><th>Importe</th>\
         <th>Fundamento y Observaci\u{f3}n</th><th>Glosador</th></tr>\n\
         <tr>\n\
         <td>{case_id}</td>\n\
         <td>{case_number} - {case_type}</td>\n\
         <td>{provider}</td>\n\
         <td>{amount}</td>\n\
         <td><strong>Fundamento:</strong> {legal_basis}<br/>\
         <strong>Observaci\u{f3}n:</strong> {observation}<br/>\
         <strong>Error:</strong> {error_code} &mdash; {error_description}</td>\n\
         <td>{reviewer}</td>\n\
         </tr>\n\
         </table>\n\
         <p><strong>CONCEPTO:</strong> {concept}</p>\n\
         <p>{recurrence}<br/><br/><strong>Nota:</strong> {note}</p>\n\
         <p>{signature}</p>\n\
         </body>\n\
         </html>\n",
        department = html_escape(&snapshot.department),
        folio = html_escape(&snapshot.folio),
        issued_at = snapshot.issued_at.format(DISPLAY_DATETIME_FMT),
        deadline = snapshot.deadline.format(DISPLAY_DATETIME_FMT),
        case_id = snapshot.case_id,
        case_number = html_escape(&snapshot.case_number),
        case_type = html_escape(&snapshot.case_type),
        provider = html_escape(&snapshot.provider),
        amount = format_amount(snapshot.amount_cents),
        legal_basis = html_escape(&snapshot.legal_basis),
        observation = html_escape(&snapshot.observation),
        error_code = html_escape(&snapshot.error_code),
        error_description = html_escape(&snapshot.error_description),
        reviewer = html_escape(&snapshot.reviewer_name),
        concept = html_escape(&snapshot.concept),
        recurrence = recurrence_section,
        note = NORMATIVE_NOTE,
        signature = signature_line,
    )
}

/// Formats an amount in cents as `$1,234.56`.
pub fn format_amount(cents: i64) -> String {
    let negative = cents < 0;
    let abs = cents.unsigned_abs();
    let whole = abs / 100;
    let fraction = abs % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
