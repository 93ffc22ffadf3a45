use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

use crate::{error::ActuationError, pixel::PixelState};

/// Logical key name as given on the command line (`w`, `space`, `f3`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyName(String);

impl KeyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asserts and deasserts a simulated key. Calls are expected to return promptly.
pub trait VirtualInput: Send + Sync {
    fn key_down(&self, key: &KeyName) -> Result<(), ActuationError>;
    fn key_up(&self, key: &KeyName) -> Result<(), ActuationError>;
}

/// Physical key event actually issued to the device.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KeyEdge {
    Pressed,
    Released,
}

/// Drives the move key from confirmed states while tracking whether it is held.
pub struct ActuationController {
    input: Arc<dyn VirtualInput>,
    key: KeyName,
    held: bool,
}

impl ActuationController {
    pub fn new(input: Arc<dyn VirtualInput>, key: KeyName) -> Self {
        Self {
            input,
            key,
            held: false,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn key(&self) -> &KeyName {
        &self.key
    }

    /// Brings the key in line with `state`. Issues nothing when it already matches.
    ///
    /// On error `held` keeps its previous value, so the next call retries the same edge.
    pub fn apply(&mut self, state: PixelState) -> Result<Option<KeyEdge>, ActuationError> {
        match (state.wants_key_held(), self.held) {
            (true, false) => {
                self.input.key_down(&self.key)?;
                self.held = true;
                Ok(Some(KeyEdge::Pressed))
            }
            (false, true) => self.release(),
            _ => Ok(None),
        }
    }

    /// Releases the key if held, whatever the confirmed state is.
    pub fn force_release(&mut self) -> Result<Option<KeyEdge>, ActuationError> {
        if self.held {
            self.release()
        } else {
            Ok(None)
        }
    }

    fn release(&mut self) -> Result<Option<KeyEdge>, ActuationError> {
        self.input.key_up(&self.key)?;
        self.held = false;
        Ok(Some(KeyEdge::Released))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    /// Records every key event; can be told to reject the next calls.
    #[derive(Default)]
    pub(crate) struct RecordingInput {
        pub(crate) events: Mutex<Vec<KeyEdge>>,
        pub(crate) failing: AtomicBool,
    }

    impl RecordingInput {
        pub(crate) fn events(&self) -> Vec<KeyEdge> {
            self.events.lock().unwrap().clone()
        }
    }

    impl VirtualInput for RecordingInput {
        fn key_down(&self, key: &KeyName) -> Result<(), ActuationError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ActuationError::Press {
                    key: key.to_string(),
                    reason: "rejected".into(),
                });
            }
            self.events.lock().unwrap().push(KeyEdge::Pressed);
            Ok(())
        }

        fn key_up(&self, key: &KeyName) -> Result<(), ActuationError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ActuationError::Release {
                    key: key.to_string(),
                    reason: "rejected".into(),
                });
            }
            self.events.lock().unwrap().push(KeyEdge::Released);
            Ok(())
        }
    }

    fn controller() -> (Arc<RecordingInput>, ActuationController) {
        let input = Arc::new(RecordingInput::default());
        let controller = ActuationController::new(input.clone(), KeyName::new("w"));
        (input, controller)
    }

    #[test]
    fn green_presses_others_release() {
        let (input, mut ctl) = controller();
        assert_eq!(ctl.apply(PixelState::Green).unwrap(), Some(KeyEdge::Pressed));
        assert!(ctl.is_held());
        assert_eq!(ctl.apply(PixelState::Red).unwrap(), Some(KeyEdge::Released));
        assert!(!ctl.is_held());
        assert_eq!(input.events(), vec![KeyEdge::Pressed, KeyEdge::Released]);
    }

    #[test]
    fn repeated_apply_is_idempotent() {
        let (input, mut ctl) = controller();
        ctl.apply(PixelState::Green).unwrap();
        assert_eq!(ctl.apply(PixelState::Green).unwrap(), None);
        ctl.apply(PixelState::Black).unwrap();
        assert_eq!(ctl.apply(PixelState::Unknown).unwrap(), None);
        assert_eq!(ctl.apply(PixelState::Red).unwrap(), None);
        assert_eq!(input.events(), vec![KeyEdge::Pressed, KeyEdge::Released]);
    }

    #[test]
    fn non_green_while_released_is_silent() {
        let (input, mut ctl) = controller();
        for state in [PixelState::Red, PixelState::Black, PixelState::Unknown] {
            assert_eq!(ctl.apply(state).unwrap(), None);
        }
        assert!(input.events().is_empty());
    }

    #[test]
    fn force_release_only_when_held() {
        let (input, mut ctl) = controller();
        assert_eq!(ctl.force_release().unwrap(), None);
        ctl.apply(PixelState::Green).unwrap();
        assert_eq!(ctl.force_release().unwrap(), Some(KeyEdge::Released));
        assert_eq!(ctl.force_release().unwrap(), None);
        assert_eq!(input.events(), vec![KeyEdge::Pressed, KeyEdge::Released]);
    }

    #[test]
    fn failed_edge_is_retried() {
        let (input, mut ctl) = controller();
        input.failing.store(true, Ordering::SeqCst);
        assert!(ctl.apply(PixelState::Green).is_err());
        assert!(!ctl.is_held());

        input.failing.store(false, Ordering::SeqCst);
        assert_eq!(ctl.apply(PixelState::Green).unwrap(), Some(KeyEdge::Pressed));

        input.failing.store(true, Ordering::SeqCst);
        assert!(ctl.force_release().is_err());
        assert!(ctl.is_held());

        input.failing.store(false, Ordering::SeqCst);
        assert_eq!(ctl.force_release().unwrap(), Some(KeyEdge::Released));
        assert_eq!(input.events(), vec![KeyEdge::Pressed, KeyEdge::Released]);
    }
}
