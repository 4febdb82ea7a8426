//! Client-side state components for the board and notification views.

pub mod services;
