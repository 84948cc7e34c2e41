//! Optional execution trace sink.

/// Observer for CPU activity, injected at construction.
///
/// All methods default to no-ops, so a sink only overrides what it needs.
/// The CPU holds the sink as an `Option`, keeping the hot path a single
/// branch when tracing is disabled.
pub trait Trace {
    /// An opcode byte was fetched at `pc`.
    fn on_fetch(&mut self, pc: u16, opcode: u8) {
        let _ = (pc, opcode);
    }

    /// A byte moved over the memory bus.
    fn on_memory(&mut self, addr: u16, value: u8, is_read: bool) {
        let _ = (addr, value, is_read);
    }

    /// A byte moved over the I/O bus.
    fn on_port(&mut self, port: u16, value: u8, is_read: bool) {
        let _ = (port, value, is_read);
    }

    /// An opcode outside the documented set was executed as a NOP.
    fn on_invalid(&mut self, pc: u16, opcode: u8) {
        let _ = (pc, opcode);
    }
}
