mod controller;
mod gallery;
mod state;

#[cfg(test)]
mod tests;

pub use controller::CaptureController;
pub use gallery::Gallery;
pub use state::{CameraState, UiSnapshot, UiState};
