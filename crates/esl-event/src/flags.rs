use bitflags::bitflags;

bitflags! {
    /// Event-level behaviour flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EventFlags: u32 {
        /// Adding a header with an existing name first deletes the old one.
        const UNIQ_HEADERS = 0b0000_0001;
    }
}
