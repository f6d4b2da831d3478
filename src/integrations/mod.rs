//! External service integrations.

pub mod autoline {
    pub use crate::autoline_client::*;
}

pub mod sap_search {
    pub use crate::sap_lookup::*;
}

pub mod sap_create {
    pub use crate::sap_create::*;
}

pub mod sap_session {
    pub use crate::sap_session::*;
}
