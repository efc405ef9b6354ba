mod error;
mod functions;
mod linker;
mod traits;
mod types;

pub use error::AuthError;
pub use functions::{
    display_name, generate_state, initials_icon, is_flow_expired, FLOW_TTL_MINUTES,
};
pub use linker::AccountLinker;
pub use traits::{AuthFlowRepository, AzureProviderClient, Result};
pub use types::{AuthFlowState, AzureClaims, LinkOutcome};
