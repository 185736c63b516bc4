use kernel_syscall::TrapFrame;

/// Per-process periodic alarm (`sigalarm` / `sigreturn`).
///
/// While armed, every user-mode timer tick counts towards `interval`. When
/// the count is reached, the interrupted registers are saved and the process
/// resumes in its handler instead. No further alarm is delivered until the
/// handler returns through [`acknowledge`](Self::acknowledge).
#[derive(Debug, Default, Clone)]
pub struct AlarmState {
    interval: u64,
    handler: u64,
    elapsed: u64,
    delivered: bool,
    saved: TrapFrame,
}

impl AlarmState {
    /// Call `handler` every `interval` ticks; an interval of 0 disarms.
    pub const fn arm(&mut self, interval: u64, handler: u64) {
        self.interval = interval;
        self.handler = handler;
        self.elapsed = 0;
        self.delivered = false;
    }

    /// Whether ticks are currently being counted.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.interval != 0 && !self.delivered
    }

    /// Whether the handler is running and has not acknowledged yet.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        self.delivered
    }

    /// Counts one tick. On the tick that completes the interval, `tf` is
    /// saved and redirected to the handler; returns whether that happened.
    pub fn on_tick(&mut self, tf: &mut TrapFrame) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed < self.interval {
            return false;
        }

        self.elapsed = 0;
        self.saved = *tf;
        tf.epc = self.handler;
        self.delivered = true;
        true
    }

    /// Returns from the handler: restores the interrupted registers and
    /// re-arms. The result is the restored `a0`, which the system call
    /// return path writes back unchanged.
    pub fn acknowledge(&mut self, tf: &mut TrapFrame) -> u64 {
        if self.delivered {
            *tf = self.saved;
            self.delivered = false;
        }
        tf.a0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> TrapFrame {
        TrapFrame {
            epc: 0x1234,
            a0: 7,
            s1: 99,
            ..TrapFrame::default()
        }
    }

    #[test]
    fn fires_on_the_nth_tick_only() {
        let mut alarm = AlarmState::default();
        alarm.arm(3, 0x4000);
        let mut tf = frame();

        assert!(!alarm.on_tick(&mut tf));
        assert!(!alarm.on_tick(&mut tf));
        assert_eq!(tf.epc, 0x1234);
        assert!(alarm.on_tick(&mut tf));
        assert_eq!(tf.epc, 0x4000);
        assert!(alarm.is_delivered());
    }

    #[test]
    fn no_second_delivery_before_acknowledgement() {
        let mut alarm = AlarmState::default();
        alarm.arm(1, 0x4000);
        let mut tf = frame();

        assert!(alarm.on_tick(&mut tf));
        tf.s1 = 1;
        for _ in 0..10 {
            assert!(!alarm.on_tick(&mut tf));
        }

        assert_eq!(alarm.acknowledge(&mut tf), 7);
        assert_eq!(tf, frame());
        assert!(alarm.is_armed());
        assert!(alarm.on_tick(&mut tf));
    }

    #[test]
    fn zero_interval_disarms() {
        let mut alarm = AlarmState::default();
        alarm.arm(0, 0x4000);
        let mut tf = frame();
        assert!(!alarm.is_armed());
        assert!(!alarm.on_tick(&mut tf));
        assert_eq!(alarm.acknowledge(&mut tf), 7);
        assert_eq!(tf, frame());
    }
}
