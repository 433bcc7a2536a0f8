pub mod classifier;
pub mod dispatcher;
pub mod foreground;
pub mod game_detect;
pub mod input_injector;
pub mod overlay_state;
pub mod policy_store;
pub mod session;
pub mod system_actions;
pub mod touch_listener;

pub use dispatcher::ActionDispatcher;
pub use foreground::create_foreground_source;
pub use overlay_state::OverlayStateMachine;
pub use policy_store::PolicyStore;
pub use session::OverlaySession;
pub use system_actions::create_system_actions;
pub use touch_listener::create_touch_listener;
