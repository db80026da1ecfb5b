//! Renders directory entries for `LIST` (UNIX `ls -l`-style) and `NLST`
//! (bare names).

use crate::fs::DirEntry;
use chrono::{DateTime, Local};
use std::ffi::CStr;

const PERM_READ: u32 = 0o4;
const PERM_WRITE: u32 = 0o2;
const PERM_EXEC: u32 = 0o1;

/// Formats one `mode nlink owner group size mtime name` line, `\r\n`-terminated.
pub fn list_line(entry: &DirEntry) -> String {
    let meta = &entry.metadata;
    let file_type = if meta.is_dir { 'd' } else { '-' };
    let perms = format_permissions(meta.mode);
    let owner = user_name(meta.uid);
    let group = group_name(meta.gid);
    let mtime = format_mtime(meta.modified);
    format!(
        "{file_type}{perms} {nlink:>3} {owner:>8} {group:>8} {size:>8} {mtime} {name}\r\n",
        nlink = meta.nlink,
        owner = owner,
        group = group,
        size = meta.len,
        mtime = mtime,
        name = entry.name,
    )
}

/// Formats one bare `name\r\n` line for `NLST`.
pub fn nlst_line(entry: &DirEntry) -> String {
    format!("{}\r\n", entry.name)
}

/// Renders a full `LIST` payload for a directory's entries.
pub fn format_list(entries: &[DirEntry]) -> String {
    entries.iter().map(list_line).collect()
}

/// Renders a full `NLST` payload for a directory's entries.
pub fn format_nlst(entries: &[DirEntry]) -> String {
    entries.iter().map(nlst_line).collect()
}

fn format_permissions(mode: u32) -> String {
    let user = (mode >> 6) & 0o7;
    let group = (mode >> 3) & 0o7;
    let other = mode & 0o7;
    let mut out = String::with_capacity(9);
    for bits in [user, group, other] {
        out.push(if bits & PERM_READ != 0 { 'r' } else { '-' });
        out.push(if bits & PERM_WRITE != 0 { 'w' } else { '-' });
        out.push(if bits & PERM_EXEC != 0 { 'x' } else { '-' });
    }
    out
}

/// `Jan  2 15:04` — month name, day right-justified in two columns, hour:minute.
fn format_mtime(modified: std::time::SystemTime) -> String {
    let dt: DateTime<Local> = modified.into();
    format!("{} {:>2} {:02}:{:02}", dt.format("%b"), dt.format("%e").to_string().trim(), dt.format("%H").to_string().parse::<u32>().unwrap_or(0), dt.format("%M").to_string().parse::<u32>().unwrap_or(0))
}

/// Resolves a numeric uid to a user name via the host's passwd database,
/// falling back to the numeric form when the lookup fails.
fn user_name(uid: u32) -> String {
    // SAFETY: getpwuid returns either null or a pointer to a statically
    // allocated passwd struct owned by libc; we only read through it before
    // any other libc call that might invalidate it, and copy the name out.
    let name = unsafe {
        let passwd = libc::getpwuid(uid);
        if passwd.is_null() {
            None
        } else {
            CStr::from_ptr((*passwd).pw_name).to_str().ok().map(str::to_owned)
        }
    };
    name.unwrap_or_else(|| uid.to_string())
}

/// Resolves a numeric gid to a group name via the host's group database,
/// falling back to the numeric form when the lookup fails.
fn group_name(gid: u32) -> String {
    // SAFETY: see `user_name`; same statically-allocated-struct contract
    // applies to `getgrgid`.
    let name = unsafe {
        let group = libc::getgrgid(gid);
        if group.is_null() {
            None
        } else {
            CStr::from_ptr((*group).gr_name).to_str().ok().map(str::to_owned)
        }
    };
    name.unwrap_or_else(|| gid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::Metadata;
    use std::time::SystemTime;

    fn entry(name: &str, is_dir: bool) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            metadata: Metadata {
                is_dir,
                is_file: !is_dir,
                len: 10,
                modified: SystemTime::now(),
                uid: 0,
                gid: 0,
                nlink: 1,
                mode: 0o644,
            },
        }
    }

    #[test]
    fn list_line_starts_with_file_type_and_permissions() {
        let line = list_line(&entry("message.md", false));
        assert!(line.starts_with("-rw-r--r--"));
        assert!(line.ends_with("message.md\r\n"));
    }

    #[test]
    fn list_line_marks_directories() {
        let line = list_line(&entry("server", true));
        assert!(line.starts_with('d'));
    }

    #[test]
    fn nlst_emits_bare_name_only() {
        assert_eq!(nlst_line(&entry("message.md", false)), "message.md\r\n");
    }

    #[test]
    fn format_list_concatenates_all_entries() {
        let entries = vec![entry("message.md", false), entry("server", true)];
        let rendered = format_list(&entries);
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn empty_directory_renders_empty_payload() {
        assert_eq!(format_list(&[]), "");
        assert_eq!(format_nlst(&[]), "");
    }
}
