use std::{backtrace::Backtrace, fmt::Write, thread};

/// Header printed above the stack dump.
pub const REPORT_HEADER: &str = "Interrupted by User\n\n\
Here's the state of all running threads, with a full backtrace of the \
current one:\n";

/// Initial capacity of the dump buffer; it doubles as the dump grows.
pub const DUMP_BUF_INIT: usize = 8192;

/// Indentation used per level by `indent()`.
const INDENT: &str = "  ";

/// Return the interrupt report: the header followed by a dump of every thread
/// in the process, indented one level.
pub fn interrupt_report() -> String {
    let dump = stack_dump();
    let mut out = String::with_capacity(REPORT_HEADER.len() + dump.len() * 2);
    out.push_str(REPORT_HEADER);
    out.push_str(&indent(&dump, 1));
    out
}

/// Prefix every non-empty line of `text` with `level` indentation steps.
pub fn indent(text: &str, level: usize) -> String {
    let prefix = INDENT.repeat(level);
    let mut out = String::with_capacity(text.len() + prefix.len() * 16);
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() {
            out.push_str(&prefix);
        }
        out.push_str(line);
    }
    out
}

/// Capture a textual dump of every thread of the process.
///
/// The calling thread gets a full symbolized backtrace. On Linux every other
/// thread is reported from `/proc/self/task` with its scheduler state, wait
/// channel and kernel stack when the latter is readable.
pub fn stack_dump() -> String {
    let mut dump = String::with_capacity(DUMP_BUF_INIT);
    let current = current_tid();

    // Writing into a `String` cannot fail.
    let _ = writeln!(
        dump,
        "thread {} {:?} (current):",
        current,
        thread::current().name().unwrap_or("<unnamed>")
    );
    let backtrace = Backtrace::force_capture().to_string();
    let _ = writeln!(dump, "{}", indent(&backtrace, 1));

    for task in other_tasks(current) {
        let _ = writeln!(dump, "{}", task);
    }

    dump
}

#[cfg(target_os = "linux")]
fn current_tid() -> i64 {
    unsafe { libc::syscall(libc::SYS_gettid) as i64 }
}

#[cfg(not(target_os = "linux"))]
fn current_tid() -> i64 {
    i64::from(std::process::id())
}

#[cfg(target_os = "linux")]
fn other_tasks(current: i64) -> Vec<String> {
    use std::fs;

    let entries = match fs::read_dir("/proc/self/task") {
        Ok(e) => e,
        Err(error) => {
            tracing::debug!(%error, "failed to enumerate threads");
            return Vec::new();
        }
    };

    let mut tids: Vec<i64> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str()?.parse().ok())
        .filter(|&tid| tid != current)
        .collect();
    tids.sort_unstable();

    tids.into_iter().filter_map(describe_task).collect()
}

#[cfg(not(target_os = "linux"))]
fn other_tasks(_current: i64) -> Vec<String> {
    Vec::new()
}

/// Describe a single thread from its `/proc` entries, or `None` if it exited
/// while being read.
#[cfg(target_os = "linux")]
fn describe_task(tid: i64) -> Option<String> {
    use std::fs;

    let dir = format!("/proc/self/task/{}", tid);
    let read = |name: &str| fs::read_to_string(format!("{}/{}", dir, name));

    let stat = read("stat").ok()?;
    let name = read("comm").unwrap_or_default();
    let wchan = read("wchan").unwrap_or_default();

    let mut out = format!(
        "thread {} {:?} [{}]",
        tid,
        name.trim_end(),
        task_state(&stat).unwrap_or('?')
    );
    match wchan.trim() {
        "" | "0" => (),
        w => {
            let _ = write!(out, " waiting in {}", w);
        }
    }
    out.push_str(":\n");

    match read("stack") {
        Ok(stack) if !stack.trim().is_empty() => {
            out.push_str(&indent(&stack, 1))
        }
        _ => out.push_str(&indent("<kernel stack unavailable>\n", 1)),
    }

    Some(out)
}

/// Extract the state character from a `/proc/<pid>/stat` line.
///
/// The thread name is parenthesized and may itself contain spaces or
/// parentheses, so the state is the first field after the last `)`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn task_state(stat: &str) -> Option<char> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.trim_start().chars().next()
}
