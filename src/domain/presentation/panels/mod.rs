pub mod diagnostics_panel;
pub mod help_panel;
pub mod settings_panel;
