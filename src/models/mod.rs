mod envelope;
mod state;
mod user;

pub use envelope::ApiResponse;
pub use state::AppState;
pub use user::User;
