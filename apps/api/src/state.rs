use grantline_application::CommandInterpreterService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub command_service: CommandInterpreterService,
}
