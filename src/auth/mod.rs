pub mod credentials;
pub mod gate;

pub use credentials::Credentials;
pub use gate::AuthContext;
