bitflags::bitflags! {
    /// A normalized filesystem change, as delivered to a
    /// [`crate::watcher::Watcher`] callback.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventKind: u32 {
        const CREATED  = 0b0000_0001;
        const MODIFIED = 0b0000_0010;
        const REMOVED  = 0b0000_0100;
        const MOVED_FROM = 0b0000_1000;
        const MOVED_TO   = 0b0001_0000;
        // Reserved for future use; never currently emitted.
        const OPENED = 0b0010_0000;
        const CLOSED = 0b0100_0000;
        const ATTRIBUTES_CHANGED = 0b1000_0000;
    }
}
