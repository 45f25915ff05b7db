pub mod settings;

pub use settings::SessionSettings;
