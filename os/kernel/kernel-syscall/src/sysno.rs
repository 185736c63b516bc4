use core::fmt;

/// System call numbers, as placed in `a7` by user code.
#[repr(u64)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Sysno {
    Fork = 1,
    Exit = 2,
    Wait = 3,
    Pipe = 4,
    Read = 5,
    Kill = 6,
    Exec = 7,
    Fstat = 8,
    Chdir = 9,
    Dup = 10,
    Getpid = 11,
    Sbrk = 12,
    Sleep = 13,
    Uptime = 14,
    Open = 15,
    Write = 16,
    Mknod = 17,
    Unlink = 18,
    Link = 19,
    Mkdir = 20,
    Close = 21,
    /// Enable call tracing for the calling process; `a0` is a bit mask of
    /// call numbers.
    Trace = 22,
    /// Fill a user buffer with free memory and process count.
    Sysinfo = 23,
    /// Call the handler in `a1` every `a0` timer ticks.
    Sigalarm = 24,
    /// Return from an alarm handler to the interrupted code.
    Sigreturn = 25,
}

impl Sysno {
    /// Every call, ordered by number.
    pub const ALL: [Self; 25] = [
        Self::Fork,
        Self::Exit,
        Self::Wait,
        Self::Pipe,
        Self::Read,
        Self::Kill,
        Self::Exec,
        Self::Fstat,
        Self::Chdir,
        Self::Dup,
        Self::Getpid,
        Self::Sbrk,
        Self::Sleep,
        Self::Uptime,
        Self::Open,
        Self::Write,
        Self::Mknod,
        Self::Unlink,
        Self::Link,
        Self::Mkdir,
        Self::Close,
        Self::Trace,
        Self::Sysinfo,
        Self::Sigalarm,
        Self::Sigreturn,
    ];

    /// Highest call number.
    pub const MAX: u64 = Self::Sigreturn as u64;

    /// The call with number `n`, if there is one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_number(n: u64) -> Option<Self> {
        if n == 0 || n > Self::MAX {
            return None;
        }
        Some(Self::ALL[(n - 1) as usize])
    }

    #[inline]
    #[must_use]
    pub const fn number(self) -> u64 {
        self as u64
    }

    /// Whether bit `number` of a `trace` mask selects this call.
    #[inline]
    #[must_use]
    pub const fn is_traced(self, mask: u64) -> bool {
        mask & (1 << self.number()) != 0
    }

    /// Lower-case name, as used by call tracing.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fork => "fork",
            Self::Exit => "exit",
            Self::Wait => "wait",
            Self::Pipe => "pipe",
            Self::Read => "read",
            Self::Kill => "kill",
            Self::Exec => "exec",
            Self::Fstat => "fstat",
            Self::Chdir => "chdir",
            Self::Dup => "dup",
            Self::Getpid => "getpid",
            Self::Sbrk => "sbrk",
            Self::Sleep => "sleep",
            Self::Uptime => "uptime",
            Self::Open => "open",
            Self::Write => "write",
            Self::Mknod => "mknod",
            Self::Unlink => "unlink",
            Self::Link => "link",
            Self::Mkdir => "mkdir",
            Self::Close => "close",
            Self::Trace => "trace",
            Self::Sysinfo => "sysinfo",
            Self::Sigalarm => "sigalarm",
            Self::Sigreturn => "sigreturn",
        }
    }
}

impl TryFrom<u64> for Sysno {
    type Error = u64;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or(value)
    }
}

impl fmt::Display for Sysno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
