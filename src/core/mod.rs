// Domain-layer modules and shared errors/models
pub mod bridge {
    pub use crate::bridge::*;
}

pub mod mapper {
    pub use crate::sap_mapper::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod probe {
    pub use crate::probe::*;
}

pub mod errors {
    pub use crate::errors::*;
}
