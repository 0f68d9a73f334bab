//! Door screen messages
//!
//! Every user-facing string of the door terminal, as compile-time constants.
//! Messages are in Spanish (Rioplatense), the language door staff work in.
//!
//! # Usage
//!
//! ```
//! use guestgate_terminal::messages::DisplayMessages;
//!
//! assert_eq!(DisplayMessages::PIN_WRONG, "PIN incorrecto");
//! ```

/// Door screen messages (Spanish)
pub struct DisplayMessages;

impl DisplayMessages {
    /// No event uses the requested door code
    pub const EVENT_NOT_FOUND: &'static str = "Evento no encontrado";

    /// The event lookup failed; retry by reloading
    pub const EVENT_LOOKUP_FAILED: &'static str = "Error buscando el evento";

    /// Malformed door code
    pub const EVENT_CODE_INVALID: &'static str = "Código de evento inválido";

    /// PIN is not 4-8 digits after normalization
    pub const PIN_INVALID: &'static str = "PIN inválido (4-8 dígitos)";

    /// PIN fingerprint does not match the event
    pub const PIN_WRONG: &'static str = "PIN incorrecto";

    /// Search attempted while the gate is locked
    pub const PIN_REQUIRED: &'static str = "Primero ingresá el PIN";

    /// CI is not 7 or 8 digits after normalization
    pub const CI_INVALID: &'static str = "CI inválida (7 u 8 dígitos)";

    /// Exact search found nobody
    pub const GUEST_NOT_ON_LIST: &'static str = "No está en la lista";

    /// Exact search failed remotely; retry with the same CI
    pub const SEARCH_FAILED: &'static str = "Error buscando invitado";

    /// Guest already has a check-in timestamp
    pub const ALREADY_CHECKED_IN: &'static str = "Ya ingresó antes";

    /// Check-in update failed remotely; retry with the same guest
    pub const CHECK_IN_FAILED: &'static str = "Error marcando ingreso";

    /// Check-in persisted
    pub const CHECK_IN_DONE: &'static str = "Ingreso marcado";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_non_empty() {
        for message in [
            DisplayMessages::EVENT_NOT_FOUND,
            DisplayMessages::EVENT_LOOKUP_FAILED,
            DisplayMessages::EVENT_CODE_INVALID,
            DisplayMessages::PIN_INVALID,
            DisplayMessages::PIN_WRONG,
            DisplayMessages::PIN_REQUIRED,
            DisplayMessages::CI_INVALID,
            DisplayMessages::GUEST_NOT_ON_LIST,
            DisplayMessages::SEARCH_FAILED,
            DisplayMessages::ALREADY_CHECKED_IN,
            DisplayMessages::CHECK_IN_FAILED,
            DisplayMessages::CHECK_IN_DONE,
        ] {
            assert!(!message.is_empty());
        }
    }

    #[test]
    fn test_messages_fit_one_line() {
        // Door screens show a single 40 column line per message
        for message in [
            DisplayMessages::PIN_INVALID,
            DisplayMessages::CI_INVALID,
            DisplayMessages::EVENT_LOOKUP_FAILED,
        ] {
            assert!(message.chars().count() <= 40);
        }
    }
}
