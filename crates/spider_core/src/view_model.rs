use crate::ScanState;

/// Read-only snapshot of a scan for presentation and assertions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanView {
    pub site: String,
    pub state: ScanState,
    pub percent: u8,
    pub crawled: u32,
    pub remaining: u32,
    pub maximum: u32,
    pub found: usize,
    pub completion: Option<bool>,
}

impl ScanView {
    pub fn is_running(&self) -> bool {
        self.state.is_active()
    }
}
