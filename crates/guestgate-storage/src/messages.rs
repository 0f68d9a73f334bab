//! Messages for organizer-side roster operations.
//!
//! Carried as the payload of [`StorageError::Validation`] and
//! [`StorageError::Duplicate`] so the front end can show them verbatim.
//! All messages are in Spanish (Rioplatense), like the door screen.
//!
//! [`StorageError::Validation`]: crate::StorageError::Validation
//! [`StorageError::Duplicate`]: crate::StorageError::Duplicate
//!
//! # Usage
//!
//! ```
//! use guestgate_storage::messages::RosterMessages;
//!
//! assert_eq!(RosterMessages::CI_LENGTH, "CI inválida (7 u 8 dígitos)");
//! ```

/// Roster administration messages (Spanish)
pub struct RosterMessages;

impl RosterMessages {
    /// Event created or edited without a name
    pub const EVENT_NAME_REQUIRED: &'static str = "El nombre es obligatorio";

    /// PIN outside 4-8 digits after normalization
    pub const PIN_LENGTH: &'static str = "El PIN debe tener entre 4 y 8 dígitos";

    /// Every generated event code collided
    pub const EVENT_CODE_EXHAUSTED: &'static str = "No se pudo crear el evento";

    /// Guest added without first or last name
    pub const GUEST_NAMES_REQUIRED: &'static str = "Nombre y apellido son obligatorios";

    /// CI outside 7-8 digits after normalization
    pub const CI_LENGTH: &'static str = "CI inválida (7 u 8 dígitos)";

    /// CI already present in the event's list
    pub const CI_ALREADY_REGISTERED: &'static str = "Esa cédula ya está registrada";

    /// Import file had no usable row
    pub const IMPORT_NO_ROWS: &'static str = "No se encontraron filas válidas";

    /// Every row of the import file was already registered
    pub const IMPORT_ALL_PRESENT: &'static str = "Todos los invitados ya estaban cargados";
}
