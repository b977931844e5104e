use crate::tips::EcoTip;

/// Per-session state behind the two button actions.
///
/// Starts with no tip and pro locked. The tip is only ever replaced, never
/// cleared, and there is no way back to locked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    eco_tip: Option<EcoTip>,
    pro_unlocked: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eco_tip(&self) -> Option<&EcoTip> {
        self.eco_tip.as_ref()
    }

    pub fn pro_unlocked(&self) -> bool {
        self.pro_unlocked
    }

    pub fn record_tip(&mut self, tip: EcoTip) -> &EcoTip {
        self.eco_tip.insert(tip)
    }

    /// Returns true only for the call that flipped the flag.
    pub fn unlock_pro(&mut self) -> bool {
        let newly_unlocked = !self.pro_unlocked;
        self.pro_unlocked = true;
        newly_unlocked
    }
}
