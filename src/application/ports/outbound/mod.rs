//! Outbound ports - Interfaces that the application requires from external systems

mod collaborator_ports;
mod event_bus_port;
mod framework_port;
mod permission_port;
mod remote_session_port;
mod restriction_state_port;
mod settings_port;
mod testing;

pub use collaborator_ports::{
    ChatCommandPort, ChatError, DeviceBattery, DeviceClientPort, DeviceError, MoodleError,
    MoodlePort, ShockCollarPort,
};
pub use event_bus_port::EventBusPort;
pub use framework_port::{FrameworkCheck, FrameworkError, FrameworkPort, GameWorldPort};
pub use permission_port::PermissionPort;
pub use remote_session_port::{RemoteError, RemoteSessionPort, StateUpdate};
pub use restriction_state_port::{RestrictionStatePort, StateError};
pub use settings_port::{RepositoryError, SettingsRepositoryPort, TriggerRepositoryPort};
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use collaborator_ports::{
    MockChatCommandPort, MockDeviceClientPort, MockMoodlePort, MockShockCollarPort,
};
#[cfg(test)]
pub use event_bus_port::MockEventBusPort;
#[cfg(test)]
pub use permission_port::MockPermissionPort;
#[cfg(test)]
pub use remote_session_port::MockRemoteSessionPort;
#[cfg(test)]
pub use restriction_state_port::MockRestrictionStatePort;
#[cfg(test)]
pub use settings_port::{MockSettingsRepositoryPort, MockTriggerRepositoryPort};
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
