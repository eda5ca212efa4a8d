mod common;

use common::*;
use sandftp::auth::DefaultAuthorizer;
use pretty_assertions::assert_eq;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpSocket, TcpStream};

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_list_session() {
    let root = start_server(2151).await;
    std::fs::write(root.path().join("hello.txt"), b"hello world").unwrap();

    let mut client = Client::connect(2151).await;
    assert_eq!(client.cmd("USER anonymous").await, "331 Username ok, send password.\r\n");
    assert_eq!(client.cmd("PASS x@y").await, "230 Login successful.\r\n");
    assert_eq!(client.cmd("TYPE A").await, "200 Type set to: ASCII.\r\n");

    let port = client.pasv().await;
    let data = tokio::spawn(read_data_connection(port));
    let reply = client.cmd("LIST").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    let listing = String::from_utf8(data.await.unwrap()).unwrap();
    assert!(listing.contains("hello.txt"), "{}", listing);
    assert!(listing.ends_with("\r\n"), "{:?}", listing);
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");

    assert_eq!(client.cmd("QUIT").await, "221 Goodbye.\r\n");
    assert!(client.at_eof().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn path_traversal_is_denied() {
    let _root = start_server(2152).await;
    let mut client = Client::connect(2152).await;
    client.login().await;
    let reply = client.cmd("CWD ../../etc").await;
    assert_eq!(
        reply,
        "550 \"/etc\" points to a path which is outside the user's root directory.\r\n"
    );
    // The session is unharmed and still rooted at "/".
    assert_eq!(client.cmd("PWD").await, "257 \"/\" is the current directory.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn rest_resumes_a_binary_download() {
    let root = start_server(2153).await;
    let original: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

    let mut client = Client::connect(2153).await;
    client.login().await;
    assert_eq!(client.cmd("TYPE I").await, "200 Type set to: Binary.\r\n");

    // Upload via STOR.
    let port = client.pasv().await;
    let upload = {
        let payload = original.clone();
        tokio::spawn(async move { write_data_connection(port, &payload).await })
    };
    let reply = client.cmd("STOR foo").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    upload.await.unwrap();
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
    assert_eq!(std::fs::read(root.path().join("foo")).unwrap(), original);

    // Resume download from offset 600.
    assert_eq!(client.cmd("REST 600").await, "350 Restarting at position 600.\r\n");
    let port = client.pasv().await;
    let data = tokio::spawn(read_data_connection(port));
    let reply = client.cmd("RETR foo").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    let tail = data.await.unwrap();
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
    assert_eq!(tail.len(), 400);
    assert_eq!(tail, original[600..]);

    // REST beyond the file size is refused, and the offset was consumed.
    assert_eq!(client.cmd("REST 2000").await, "350 Restarting at position 2000.\r\n");
    let _ = client.pasv().await;
    assert_eq!(client.cmd("RETR foo").await, "554 Invalid REST parameter.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn max_login_attempts_disconnect() {
    let _root = start_server(2154).await;
    let mut client = Client::connect(2154).await;
    for _ in 0..2 {
        client.cmd("USER alice").await;
        assert_eq!(client.cmd("PASS wrong").await, "530 Authentication failed.\r\n");
    }
    client.cmd("USER alice").await;
    assert_eq!(client.cmd("PASS wrong").await, "530 Maximum login attempts. Disconnecting.\r\n");
    assert!(client.at_eof().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_without_record_is_refused() {
    let _root = start_server_no_anonymous(2155).await;
    let mut client = Client::connect(2155).await;
    client.cmd("USER anonymous").await;
    assert_eq!(client.cmd("PASS x@y").await, "530 Anonymous access not allowed.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn abor_without_a_data_channel() {
    let _root = start_server(2156).await;
    let mut client = Client::connect(2156).await;
    client.login().await;
    assert_eq!(client.cmd("ABOR").await, "225 No transfer to abort.\r\n");
    // With a listening but unconnected passive channel the reply changes.
    let _port = client.pasv().await;
    assert_eq!(client.cmd("ABOR").await, "225 ABOR command successful; data channel closed.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_lifecycle() {
    let root = start_server(2157).await;
    let mut client = Client::connect(2157).await;
    client.login().await;

    assert_eq!(client.cmd("MKD sub").await, "257 \"/sub\" directory created.\r\n");
    assert_eq!(client.cmd("CWD sub").await, "250 \"/sub\" is the current directory.\r\n");
    assert_eq!(client.cmd("PWD").await, "257 \"/sub\" is the current directory.\r\n");
    assert_eq!(client.cmd("CDUP").await, "250 \"/\" is the current directory.\r\n");

    std::fs::write(root.path().join("old.txt"), b"payload").unwrap();
    assert_eq!(client.cmd("RNFR old.txt").await, "350 Ready for destination name.\r\n");
    assert_eq!(client.cmd("RNTO sub/new.txt").await, "250 Renaming ok.\r\n");
    assert!(root.path().join("sub/new.txt").exists());

    // The RNFR source is consumed, a lone RNTO is out of sequence.
    let reply = client.cmd("RNTO elsewhere.txt").await;
    assert!(reply.starts_with("503 "), "{}", reply);

    assert_eq!(client.cmd("DELE sub/new.txt").await, "250 File removed.\r\n");
    assert_eq!(client.cmd("RMD sub").await, "250 Directory removed.\r\n");
    let reply = client.cmd("RMD /").await;
    assert_eq!(reply, "550 Can't remove root directory.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn size_and_mdtm() {
    let root = start_server(2158).await;
    std::fs::write(root.path().join("five.bin"), b"12345").unwrap();
    let mut client = Client::connect(2158).await;
    client.login().await;

    assert_eq!(client.cmd("SIZE five.bin").await, "213 5\r\n");
    assert_eq!(client.cmd("SIZE /").await, "550 Could not get a file size.\r\n");

    let reply = client.cmd("MDTM five.bin").await;
    assert!(reply.starts_with("213 "), "{}", reply);
    let stamp = reply.trim_end().trim_start_matches("213 ");
    assert_eq!(stamp.len(), 14, "{}", reply);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()), "{}", reply);

    let reply = client.cmd("MDTM /").await;
    assert_eq!(reply, "550 / is not retrievable.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn pre_auth_surface() {
    let _root = start_server(2159).await;
    let mut client = Client::connect(2159).await;

    // Pre-auth commands answer; everything else is gated.
    let reply = client.cmd("SYST").await;
    assert_eq!(reply, "215 UNIX Type: L8\r\n");
    let reply = client.cmd("NOOP").await;
    assert!(reply.starts_with("250 "), "{}", reply);
    let reply = client.cmd("FEAT").await;
    assert!(reply.contains(" REST STREAM\r\n"), "{}", reply);
    assert!(reply.contains(" TVFS\r\n"), "{}", reply);
    let reply = client.cmd("STAT").await;
    assert!(reply.starts_with("211-"), "{}", reply);
    assert!(reply.contains("Waiting for username."), "{}", reply);

    assert_eq!(client.cmd("LIST").await, "530 Log in with USER and PASS first.\r\n");
    assert_eq!(client.cmd("STAT *").await, "530 Log in with USER and PASS first.\r\n");
    assert_eq!(client.cmd("REIN").await, "530 Log in with USER and PASS first.\r\n");

    // Syntax errors.
    assert_eq!(client.cmd("FOO").await, "500 Command \"FOO\" not understood.\r\n");
    assert_eq!(client.cmd("RETR").await, "501 Syntax error: command needs an argument.\r\n");
    assert_eq!(client.cmd("PASV nope").await, "501 Syntax error: command does not accept arguments.\r\n");
    let long = format!("NOOP {}", "x".repeat(3000));
    assert_eq!(client.cmd(&long).await, "500 Command too long.\r\n");
    // The discarded long line does not poison the next one.
    let reply = client.cmd("NOOP").await;
    assert!(reply.starts_with("250 "), "{}", reply);
}

#[tokio::test(flavor = "multi_thread")]
async fn stou_picks_a_unique_name_and_appe_appends() {
    let root = start_server(2160).await;
    let mut client = Client::connect(2160).await;
    client.login().await;
    assert_eq!(client.cmd("TYPE I").await, "200 Type set to: Binary.\r\n");

    let port = client.pasv().await;
    let upload = tokio::spawn(async move { write_data_connection(port, b"unique contents").await });
    let reply = client.cmd("STOU").await;
    assert!(reply.starts_with("150 FILE: ftpd.") || reply.starts_with("125 FILE: ftpd."), "{}", reply);
    let name = reply.trim_end().split("FILE: ").nth(1).unwrap().to_string();
    upload.await.unwrap();
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
    assert_eq!(std::fs::read(root.path().join(&name)).unwrap(), b"unique contents");

    std::fs::write(root.path().join("log.txt"), b"one").unwrap();
    let port = client.pasv().await;
    let upload = tokio::spawn(async move { write_data_connection(port, b"two").await });
    let reply = client.cmd("APPE log.txt").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    upload.await.unwrap();
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
    assert_eq!(std::fs::read(root.path().join("log.txt")).unwrap(), b"onetwo");
}

#[tokio::test(flavor = "multi_thread")]
async fn ascii_type_round_trips() {
    let root = start_server(2161).await;
    let mut client = Client::connect(2161).await;
    client.login().await;
    assert_eq!(client.cmd("TYPE A").await, "200 Type set to: ASCII.\r\n");

    // An ASCII upload normalizes CRLF to the host separator...
    let port = client.pasv().await;
    let upload = tokio::spawn(async move { write_data_connection(port, b"line one\r\nline two\r\n").await });
    let reply = client.cmd("STOR notes.txt").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    upload.await.unwrap();
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
    assert_eq!(std::fs::read(root.path().join("notes.txt")).unwrap(), b"line one\nline two\n");

    // ...and the download puts CRLF back.
    let port = client.pasv().await;
    let data = tokio::spawn(read_data_connection(port));
    let reply = client.cmd("RETR notes.txt").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    assert_eq!(data.await.unwrap(), b"line one\r\nline two\r\n");
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");

    // SIZE reports raw host bytes no matter the type.
    assert_eq!(client.cmd("SIZE notes.txt").await, "213 18\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn mlsd_and_mlst_facts() {
    let root = start_server(2162).await;
    std::fs::write(root.path().join("song.mp3"), b"abc").unwrap();
    std::fs::create_dir(root.path().join("music")).unwrap();
    let mut client = Client::connect(2162).await;
    client.login().await;

    let port = client.pasv().await;
    let data = tokio::spawn(read_data_connection(port));
    let reply = client.cmd("MLSD").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    let listing = String::from_utf8(data.await.unwrap()).unwrap();
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
    assert!(listing.contains("type=file;size=3;"), "{}", listing);
    assert!(listing.contains("; song.mp3\r\n"), "{}", listing);
    assert!(listing.contains("type=dir;"), "{}", listing);

    // MLSD of a file is a parameter error.
    assert_eq!(client.cmd("MLSD song.mp3").await, "501 No such directory.\r\n");

    // MLST rides on the control channel and names the virtual path.
    let reply = client.cmd("MLST song.mp3").await;
    assert!(reply.starts_with("250-"), "{}", reply);
    assert!(reply.contains(" type=file;"), "{}", reply);
    assert!(reply.contains(" /song.mp3\r\n"), "{}", reply);
}

#[tokio::test(flavor = "multi_thread")]
async fn stat_with_glob_argument() {
    let root = start_server(2163).await;
    std::fs::write(root.path().join("data.1"), b"x").unwrap();
    std::fs::write(root.path().join("data.2"), b"x").unwrap();
    std::fs::write(root.path().join("other"), b"x").unwrap();
    let mut client = Client::connect(2163).await;
    client.login().await;

    let reply = client.cmd("STAT data.*").await;
    assert!(reply.starts_with("213-"), "{}", reply);
    assert!(reply.contains("data.1"), "{}", reply);
    assert!(reply.contains("data.2"), "{}", reply);
    assert!(!reply.contains("other"), "{}", reply);

    let reply = client.cmd("STAT d*/x").await;
    assert_eq!(reply, "550 Directory recursion not supported.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn rein_flushes_the_account() {
    let _root = start_server(2164).await;
    let mut client = Client::connect(2164).await;
    client.login().await;
    assert_eq!(client.cmd("TYPE I").await, "200 Type set to: Binary.\r\n");
    assert_eq!(client.cmd("REIN").await, "230 Ready for new user.\r\n");
    assert_eq!(client.cmd("PWD").await, "530 Log in with USER and PASS first.\r\n");
    // Logging back in works and the transfer parameters are back at their
    // defaults (TYPE defaults to ASCII).
    client.login().await;
    let reply = client.cmd("STAT").await;
    assert!(reply.contains("TYPE: ASCII;"), "{}", reply);
}

#[tokio::test(flavor = "multi_thread")]
async fn abort_mid_transfer() {
    let root = start_server(2165).await;
    // A payload big enough that the transfer is still running when ABOR hits.
    std::fs::write(root.path().join("big.bin"), vec![0u8; 64 * 1024 * 1024]).unwrap();
    let mut client = Client::connect(2165).await;
    client.login().await;
    assert_eq!(client.cmd("TYPE I").await, "200 Type set to: Binary.\r\n");

    let port = client.pasv().await;
    let mut data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let reply = client.cmd("RETR big.bin").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);

    // Read a little, then abort.
    let mut buf = vec![0u8; 1024];
    data.read_exact(&mut buf).await.unwrap();
    let reply = client.cmd("ABOR").await;
    assert_eq!(reply, "426 Connection closed; transfer aborted.\r\n");
    assert_eq!(client.read_reply().await, "226 ABOR command successful.\r\n");
    // The data socket dies without delivering the whole file; depending on
    // timing the close surfaces as EOF or as a connection reset.
    let mut rest = Vec::new();
    let n = data.read_to_end(&mut rest).await.unwrap_or(0);
    assert!(n + 1024 < 64 * 1024 * 1024, "transfer was not aborted");
}

#[tokio::test(flavor = "multi_thread")]
async fn foreign_pasv_connection_is_rejected() {
    let root = start_server(2166).await;
    std::fs::write(root.path().join("x.txt"), b"x").unwrap();
    let mut client = Client::connect(2166).await;
    client.login().await;
    let port = client.pasv().await;

    // Dial the data port from 127.0.0.2: a different address than the
    // control channel peer, which connected from 127.0.0.1.
    let socket = TcpSocket::new_v4().unwrap();
    if socket.bind("127.0.0.2:0".parse().unwrap()).is_err() {
        // Loopback aliases unavailable on this host; nothing to test.
        return;
    }
    let foreign = socket.connect(format!("127.0.0.1:{}", port).parse().unwrap()).await.unwrap();
    let reply = client.read_reply().await;
    assert!(
        reply.starts_with("425 Rejected data connection from foreign address 127.0.0.2:"),
        "{}",
        reply
    );
    drop(foreign);

    // The listener survives the rejection: the legitimate peer still works.
    let data = tokio::spawn(read_data_connection(port));
    let reply = client.cmd("LIST").await;
    assert!(reply.starts_with("150 ") || reply.starts_with("125 "), "{}", reply);
    let listing = String::from_utf8(data.await.unwrap()).unwrap();
    assert!(listing.contains("x.txt"), "{}", listing);
    assert_eq!(client.read_reply().await, "226 Transfer complete.\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn read_only_user_cannot_write() {
    let root = start_server(2167).await;
    std::fs::write(root.path().join("keep.txt"), b"x").unwrap();
    let mut client = Client::connect(2167).await;
    client.cmd("USER anonymous").await;
    client.cmd("PASS guest@").await;

    assert_eq!(client.cmd("DELE keep.txt").await, "550 Can't DELE: not enough privileges.\r\n");
    assert_eq!(client.cmd("MKD sub").await, "550 Can't MKD: not enough privileges.\r\n");
    let _port = client.pasv().await;
    assert_eq!(client.cmd("STOR up.txt").await, "550 Can't STOR: not enough privileges.\r\n");
    assert!(root.path().join("keep.txt").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_caps_turn_clients_away() {
    let root = tempfile::tempdir().unwrap();
    let auth = DefaultAuthorizer::new();
    auth.add_user("alice", "secret", root.path(), "rw").unwrap();
    let server = sandftp::ServerBuilder::new(std::sync::Arc::new(auth))
        .greeting("capped server ready.")
        .max_connections(1)
        .build();
    tokio::spawn(async move {
        server.listen("127.0.0.1:2168").await.unwrap();
    });

    let first = Client::connect(2168).await;
    let mut second = Client::connect_raw(2168).await;
    let reply = second.read_reply().await;
    assert_eq!(reply, "421 Too many connections. Service temporary unavailable.\r\n");
    assert!(second.at_eof().await);
    drop(first);

    // Capacity frees up once the first session is gone.
    for _ in 0..50 {
        let mut retry = Client::connect_raw(2168).await;
        if retry.read_reply().await.starts_with("220 ") {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    panic!("capacity never freed up");
}
