/// Fire-and-forget publisher for rendered results, addressed by topic.
///
/// The serving layer owns the transport (sockets, push, ...). Profiling never
/// publishes on its own; callers decide whether and where a result goes.
pub trait Notifier {
    fn publish(&self, topic: &str, message: &str);
}

/// Publishes through the `log` facade at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn publish(&self, topic: &str, message: &str) {
        log::info!(target: "notify", "[{topic}] {message}");
    }
}
