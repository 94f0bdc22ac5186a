use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::message::Message;
use crate::paths;

const BADGE_MAX: u64 = 99;

/// Running total of removed elements and cleared cookies across passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCounter {
    #[serde(default)]
    pub total_counter: u64,
}

impl BadgeCounter {
    /// Load the persisted total from `<root>/.uncookie/state.yaml`.
    pub fn load(root: &Path) -> Result<Self> {
        match crate::io::read_optional(&paths::state_path(root))? {
            Some(data) => Ok(serde_yaml::from_str(&data)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::state_path(root), data.as_bytes())
    }

    pub fn apply(&mut self, message: &Message) {
        match message {
            Message::UpdateCounter { count } => {
                self.total_counter = self.total_counter.saturating_add(*count)
            }
            Message::ResetCounter => self.total_counter = 0,
            Message::ClearAllCookies => {}
        }
    }

    pub fn badge_text(&self) -> String {
        if self.total_counter > BADGE_MAX {
            format!("{BADGE_MAX}+")
        } else {
            self.total_counter.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_resets() {
        let mut c = BadgeCounter::default();
        c.apply(&Message::UpdateCounter { count: 2 });
        c.apply(&Message::ClearAllCookies);
        c.apply(&Message::UpdateCounter { count: 5 });
        assert_eq!(c.total_counter, 7);
        assert_eq!(c.badge_text(), "7");
        c.apply(&Message::ResetCounter);
        assert_eq!(c.badge_text(), "0");
    }

    #[test]
    fn badge_caps_at_99_plus() {
        let c = BadgeCounter { total_counter: 99 };
        assert_eq!(c.badge_text(), "99");
        let c = BadgeCounter { total_counter: 100 };
        assert_eq!(c.badge_text(), "99+");
    }

    #[test]
    fn persists_under_root() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(BadgeCounter::load(dir.path()).unwrap().total_counter, 0);
        BadgeCounter { total_counter: 12 }.save(dir.path()).unwrap();
        assert_eq!(BadgeCounter::load(dir.path()).unwrap().total_counter, 12);
    }
}
