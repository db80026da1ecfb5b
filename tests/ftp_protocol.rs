//! End-to-end protocol tests: spin up a real server on an ephemeral port
//! against a temporary virtual root, then drive it with a real FTP client.

use async_ftp::FtpStream;
use pretty_assertions::assert_eq;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicU16, Ordering};
use tempfile::TempDir;

static TEST_PORT: AtomicU16 = AtomicU16::new(12121);

struct Harness {
    addr: String,
    _root: TempDir,
}

async fn spawn_server() -> Harness {
    let port = TEST_PORT.fetch_add(1, Ordering::Relaxed);
    let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
    let addr = bind.to_string();

    let root_dir = TempDir::new().unwrap();
    let root = root_dir.path().to_path_buf();
    sandbox_ftpd::fs::seed_root(&root).await.unwrap();

    tokio::spawn(sandbox_ftpd::server::listen(bind, root));

    while FtpStream::connect(&addr).await.is_err() {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    Harness { addr, _root: root_dir }
}

#[tokio::test]
async fn connect_and_login_is_always_accepted() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("anyone", "anything").await.unwrap();
    ftp.quit().await.unwrap();
}

#[tokio::test]
async fn pwd_reports_root_as_slash() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    let pwd = ftp.pwd().await.unwrap();
    assert_eq!(pwd, "/");
}

#[tokio::test]
async fn list_shows_seeded_entries() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    let entries = ftp.list(None).await.unwrap();
    assert!(entries.iter().any(|l| l.ends_with("message.md")));
    assert!(entries.iter().any(|l| l.ends_with("server")));
}

#[tokio::test]
async fn nlst_lists_bare_names() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    let names = ftp.nlst(None).await.unwrap();
    assert!(names.contains(&"message.md".to_string()));
    assert!(names.contains(&"server".to_string()));
}

#[tokio::test]
async fn retr_round_trips_seeded_file_contents() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    let data = ftp.simple_retr("message.md").await.unwrap().into_inner();
    assert_eq!(data, b"hello\nftp\n".to_vec());
}

#[tokio::test]
async fn cwd_into_subdirectory_and_back_updates_pwd() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    ftp.cwd("server").await.unwrap();
    assert_eq!(ftp.pwd().await.unwrap(), "/server");
    ftp.cdup().await.unwrap();
    assert_eq!(ftp.pwd().await.unwrap(), "/");
}

#[tokio::test]
async fn cdup_from_the_virtual_root_stays_at_root() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    // Issued before any other CWD, so cwd == root; popping past root must
    // clamp rather than reanchor onto root's own host-path segments.
    ftp.cdup().await.unwrap();
    assert_eq!(ftp.pwd().await.unwrap(), "/");
}

#[tokio::test]
async fn cwd_dotdot_from_the_virtual_root_stays_at_root() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    ftp.cwd("..").await.unwrap();
    assert_eq!(ftp.pwd().await.unwrap(), "/");
}

#[tokio::test]
async fn cwd_cannot_escape_the_virtual_root() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    // The `..` chain clamps to root; "etc" doesn't exist there, so the
    // escape attempt is refused rather than landing outside the root.
    assert!(ftp.cwd("../../../../etc").await.is_err());
    assert_eq!(ftp.pwd().await.unwrap(), "/");
}

#[tokio::test]
async fn stor_then_retr_round_trips() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    let mut reader = std::io::Cursor::new(b"round trip payload".to_vec());
    ftp.put("uploaded.txt", &mut reader).await.unwrap();
    let data = ftp.simple_retr("uploaded.txt").await.unwrap().into_inner();
    assert_eq!(data, b"round trip payload".to_vec());
}

#[tokio::test]
async fn mkd_duplicate_is_rejected_then_rmd_removes_it() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    ftp.mkdir("fresh").await.unwrap();
    assert!(ftp.mkdir("fresh").await.is_err());
    ftp.rmdir("fresh").await.unwrap();
    assert!(ftp.cwd("fresh").await.is_err());
}

#[tokio::test]
async fn retr_after_dele_fails() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    let mut reader = std::io::Cursor::new(b"temp".to_vec());
    ftp.put("temp.txt", &mut reader).await.unwrap();
    ftp.rm("temp.txt").await.unwrap();
    assert!(ftp.simple_retr("temp.txt").await.is_err());
}

#[tokio::test]
async fn unknown_verb_is_rejected_politely() {
    let harness = spawn_server().await;
    let mut ftp = FtpStream::connect(&harness.addr).await.unwrap();
    ftp.login("u", "p").await.unwrap();
    // NOOP isn't in this server's verb table; it should come back as an
    // unimplemented-command error rather than closing the connection.
    assert!(ftp.noop().await.is_err());
    ftp.quit().await.unwrap();
}
