//! End-to-end sessions over in-memory and TCP streams.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use mailgate_crypto::{Algorithm, BlockMode, Cipher, KeyPair, digest_hex};
use mailgate_proto::command::{SearchField, Selection};
use mailgate_proto::session::NOTICE_WRITE_TIMEOUT;
use mailgate_proto::{
    CipherMode, Config, Error, Flag, FramedStream, Handlers, MailStore, MemoryStore, Message,
    MessageId, NewMessage, SecureChannel, Server, Session, StoreError, StoreResult, Uid,
};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

const MAILBOX: &str = "mailbox1";
const PASSWORD: &str = "password1";

/// Client half of a session.
struct Client<S> {
    channel: SecureChannel<S>,
}

impl<S> Client<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    fn new(stream: S, idle: Duration) -> Self {
        Self {
            channel: SecureChannel::new(FramedStream::new(stream, 1 << 20), idle),
        }
    }

    async fn read_until_done(&mut self) -> Vec<String> {
        let mut replies = Vec::new();
        loop {
            let reply = self.channel.read_line().await.unwrap();
            let done = reply.starts_with("OK ") || reply.starts_with("BAD ");
            replies.push(reply);
            if done {
                return replies;
            }
        }
    }

    async fn command(&mut self, line: &str) -> Vec<String> {
        self.channel.write_line(line).await.unwrap();
        self.read_until_done().await
    }

    async fn auth(&mut self, mode: CipherMode) -> Vec<String> {
        self.channel.write_line(&format!("AUTH {mode}")).await.unwrap();
        self.channel.initiate(mode).await.unwrap();
        self.read_until_done().await
    }
}

async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .create_mailbox(
            MAILBOX,
            &digest_hex(PASSWORD.as_bytes()),
            "token-1",
            "derby.ac.uk",
        )
        .await
        .unwrap();

    let seed = [
        (4, Flag::Seen, "quarterly report"),
        (1, Flag::Recent, "welcome"),
        (3, Flag::Seen, "lunch"),
        (2, Flag::Seen, "project kickoff"),
        (5, Flag::Draft, "unfinished"),
    ];
    for (day, flag, subject) in seed {
        store
            .insert_message(
                MAILBOX,
                NewMessage {
                    sender: "alice@derby.ac.uk".into(),
                    recipients: "mailbox1@derby.ac.uk".into(),
                    subject: subject.into(),
                    date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                    mime: "text/plain".into(),
                    body: format!("about the {subject}"),
                    flag,
                },
            )
            .unwrap();
    }
    store
}

/// Store that answers pings and fails every other call.
struct PingOnlyStore;

fn untouchable<T>() -> StoreResult<T> {
    Err(StoreError::new("store must not be consulted"))
}

#[async_trait]
impl MailStore for PingOnlyStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn mailbox_exists(&self, _mailbox: &str) -> StoreResult<bool> {
        untouchable()
    }

    async fn create_mailbox(
        &self,
        _mailbox: &str,
        _password_digest: &str,
        _token: &str,
        _domain: &str,
    ) -> StoreResult<()> {
        untouchable()
    }

    async fn validate_mailbox(&self, _mailbox: &str, _digest: &str) -> StoreResult<bool> {
        untouchable()
    }

    async fn validate_token(&self, _mailbox: &str, _token: &str) -> StoreResult<bool> {
        untouchable()
    }

    async fn store_token(&self, _mailbox: &str, _token: &str) -> StoreResult<()> {
        untouchable()
    }

    async fn reset_uid_density(&self, _mailbox: &str) -> StoreResult<()> {
        untouchable()
    }

    async fn count_messages(&self, _mailbox: &str) -> StoreResult<u64> {
        untouchable()
    }

    async fn count_by_flag(&self, _mailbox: &str, _flag: Flag) -> StoreResult<u64> {
        untouchable()
    }

    async fn get_messages(
        &self,
        _mailbox: &str,
        _selection: &Selection,
    ) -> StoreResult<Vec<Message>> {
        untouchable()
    }

    async fn update_message_flag(
        &self,
        _mailbox: &str,
        _id: MessageId,
        _flag: Flag,
    ) -> StoreResult<bool> {
        untouchable()
    }

    async fn delete_flagged(&self, _mailbox: &str) -> StoreResult<u64> {
        untouchable()
    }

    async fn search_by_key(
        &self,
        _mailbox: &str,
        _field: SearchField,
        _value: &str,
    ) -> StoreResult<Vec<Uid>> {
        untouchable()
    }

    async fn search_all(&self, _mailbox: &str, _value: &str) -> StoreResult<Vec<Uid>> {
        untouchable()
    }

    async fn search_since(&self, _mailbox: &str, _date: NaiveDate) -> StoreResult<Vec<Uid>> {
        untouchable()
    }

    async fn search_until(&self, _mailbox: &str, _date: NaiveDate) -> StoreResult<Vec<Uid>> {
        untouchable()
    }
}

fn start(
    store: Arc<MemoryStore>,
    config: Config,
) -> (Client<DuplexStream>, JoinHandle<mailgate_proto::Result<()>>) {
    let (server, client) = tokio::io::duplex(64 * 1024);
    let session = Session::new(
        server,
        store,
        Arc::new(Handlers::standard()),
        Arc::new(config),
    );
    let handle = tokio::spawn(session.run());
    (Client::new(client, Duration::from_secs(3600)), handle)
}

fn start_with(
    store: Arc<dyn MailStore>,
) -> (Client<DuplexStream>, JoinHandle<mailgate_proto::Result<()>>) {
    let (server, client) = tokio::io::duplex(64 * 1024);
    let session = Session::new(
        server,
        store,
        Arc::new(Handlers::standard()),
        Arc::new(Config::default()),
    );
    (
        Client::new(client, Duration::from_secs(3600)),
        tokio::spawn(session.run()),
    )
}

async fn logged_in() -> (Client<DuplexStream>, JoinHandle<mailgate_proto::Result<()>>) {
    let (mut client, handle) = start(seeded_store().await, Config::default());
    client.read_until_done().await;
    client.command(&format!("LOGIN {MAILBOX} {PASSWORD}")).await;
    client.command("SELECT").await;
    (client, handle)
}

#[tokio::test]
async fn test_greeting() {
    let (mut client, handle) = start(seeded_store().await, Config::default());
    assert_eq!(
        client.read_until_done().await,
        ["OK derby.ac.uk Server running"]
    );
    assert_eq!(client.command("QUIT").await, ["OK QUIT Completed"]);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_store_unavailable_closes() {
    let (mut client, handle) = start(Arc::new(MemoryStore::offline()), Config::default());
    assert_eq!(
        client.read_until_done().await,
        ["BAD derby.ac.uk not available, closing connection"]
    );
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

async fn read_sealed(raw: &mut FramedStream<DuplexStream>, cipher: &Cipher) -> String {
    let iv = raw.read_frame().await.unwrap();
    assert_eq!(iv.len(), 16);
    let ciphertext = raw.read_frame().await.unwrap();
    String::from_utf8(cipher.open(Some(&iv), &ciphertext).unwrap()).unwrap()
}

#[tokio::test]
async fn test_auth_aes_cbc_uses_iv_frame_pairs() {
    let (server, client) = tokio::io::duplex(64 * 1024);
    let session = Session::new(
        server,
        seeded_store().await,
        Arc::new(Handlers::standard()),
        Arc::new(Config::default()),
    );
    let handle = tokio::spawn(session.run());
    let mut raw = FramedStream::new(client, 1 << 20);

    assert_eq!(raw.read_frame().await.unwrap(), b"OK derby.ac.uk Server running");
    raw.write_frame(b"AUTH AES/CBC").await.unwrap();

    let ours = KeyPair::generate();
    raw.write_frame(&ours.public_bytes()).await.unwrap();
    let theirs = raw.read_frame().await.unwrap();
    assert_eq!(theirs.len(), 32);
    let secret = ours.agree(&theirs).unwrap();
    let cipher = Cipher::new(Algorithm::Aes, BlockMode::Cbc, secret.as_bytes()).unwrap();

    assert_eq!(
        read_sealed(&mut raw, &cipher).await,
        "* AES/CBC Encryption is established"
    );
    assert_eq!(read_sealed(&mut raw, &cipher).await, "OK AUTH Completed");

    let sealed = cipher.seal(b"NOOP").unwrap();
    raw.write_frame(sealed.iv().unwrap()).await.unwrap();
    raw.write_frame(sealed.ciphertext()).await.unwrap();
    assert_eq!(read_sealed(&mut raw, &cipher).await, "OK NOOP Completed");

    drop(raw);
    assert!(handle.await.unwrap().unwrap_err().is_disconnect());
}

#[tokio::test]
async fn test_every_cipher_mode_serves_commands() {
    for mode in CipherMode::ALL {
        let (mut client, handle) = start(seeded_store().await, Config::default());
        client.read_until_done().await;

        let replies = client.auth(mode).await;
        assert_eq!(replies, [mode.notice(), "OK AUTH Completed"]);

        let replies = client.command(&format!("LOGIN {MAILBOX} {PASSWORD}")).await;
        let warned = replies[0].starts_with("* WARNING");
        assert_eq!(warned, !mode.is_encrypted());
        assert_eq!(replies.last().unwrap(), "OK LOGIN Completed");

        assert_eq!(client.command("QUIT").await, ["OK QUIT Completed"]);
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_auth_unknown_algorithm() {
    let (mut client, _handle) = start(seeded_store().await, Config::default());
    client.read_until_done().await;
    assert_eq!(
        client.command("AUTH RSA").await,
        ["BAD Syntax Error, Algorithm name is not valid!"]
    );
    assert_eq!(
        client.command("AUTH").await,
        ["BAD Authentication Failed, Parsing Arguments Error!"]
    );
}

#[tokio::test]
async fn test_create_short_mailbox() {
    let (mut client, _handle) = start(seeded_store().await, Config::default());
    client.read_until_done().await;
    assert_eq!(
        client.command("CREATE mailbox pw123456").await,
        ["BAD mailbox is too short, must be minimal 8 characters!"]
    );
    assert_eq!(client.command("NOOP").await, ["OK NOOP Completed"]);
}

#[tokio::test]
async fn test_create_validates_before_store_lookup() {
    let (mut client, handle) = start_with(Arc::new(PingOnlyStore));
    client.read_until_done().await;
    assert_eq!(
        client.command("CREATE mailbox pw123456").await,
        ["BAD mailbox is too short, must be minimal 8 characters!"]
    );
    assert_eq!(
        client.command("CREATE mailbøx12 secret123").await,
        ["BAD Mailbox name must contain only 7-Bit ASCII Characters!"]
    );
    assert_eq!(client.command("NOOP").await, ["OK NOOP Completed"]);
    assert!(!handle.is_finished());

    client.channel.write_line("CREATE mailbox12 secret123").await.unwrap();
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[tokio::test]
async fn test_create_then_token_login() {
    let store = seeded_store().await;
    let (mut client, _handle) = start(Arc::clone(&store), Config::default());
    client.read_until_done().await;

    let replies = client.command("CREATE newmailbox secret123").await;
    assert_eq!(replies.len(), 2);
    let token = replies[0].strip_prefix("* TOKEN ").unwrap().to_string();
    assert_eq!(replies[1], "OK CREATE Completed");
    assert_eq!(store.domain_of("newmailbox").as_deref(), Some("derby.ac.uk"));

    assert_eq!(
        client.command("CREATE othermailbox pw").await,
        ["BAD Syntax Error, Mailbox is in SELECT STATE! For more info use HELP Command."]
    );

    let (mut second, _h2) = start(Arc::clone(&store), Config::default());
    second.read_until_done().await;
    assert_eq!(
        second.command("CREATE newmailbox secret123").await,
        ["BAD mailbox Already Exists, Try different one"]
    );
    assert_eq!(
        second.command("TOKEN newmailbox not-the-token").await,
        ["BAD Token Validation Failed"]
    );
    assert_eq!(
        second.command(&format!("TOKEN newmailbox {token}")).await,
        ["OK TOKEN Completed"]
    );
    assert_eq!(
        second.command("SELECT").await,
        [
            "* 0 EXISTS",
            "* 0 RECENT",
            "* 0 SENT",
            "* 0 DRAFT",
            "* 0 SEEN",
            "* 0 DELETED",
            "OK SELECT Completed"
        ]
    );
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (mut client, _handle) = start(seeded_store().await, Config::default());
    client.read_until_done().await;
    assert_eq!(
        client.command(&format!("LOGIN {MAILBOX} wrongpass")).await,
        ["BAD mailbox validation failed"]
    );
    assert_eq!(
        client.command("SELECT").await,
        ["BAD Syntax Error, Mailbox is in AUTHENTICATE STATE! For more info use HELP Command."]
    );
}

#[tokio::test]
async fn test_fetch_range_with_flag() {
    let (mut client, _handle) = logged_in().await;

    let replies = client.command("FETCH 1:3 SEEN").await;
    assert_eq!(replies.len(), 5);
    assert_eq!(replies[4], "OK FETCH Completed");

    let headers: Vec<&String> = replies.iter().step_by(2).take(2).collect();
    let bodies: Vec<&String> = replies.iter().skip(1).step_by(2).take(2).collect();
    for (header, body) in headers.iter().zip(&bodies) {
        assert!(header.starts_with("* FETCH ID "));
        let size: usize = header.rsplit(' ').next().unwrap().parse().unwrap();
        assert_eq!(size, body.len());
    }
    assert!(bodies[0].contains("UID: 2\r\n"));
    assert!(bodies[0].contains("Subject: project kickoff\r\n"));
    assert!(bodies[0].contains("Date: 2024-01-02\r\n"));
    assert!(bodies[1].contains("UID: 3\r\n"));
    assert!(bodies[1].ends_with("about the lunch"));
}

#[tokio::test]
async fn test_fetch_variants() {
    let (mut client, _handle) = logged_in().await;

    assert_eq!(client.command("FETCH").await, ["BAD FETCH syntax error"]);
    assert_eq!(client.command("FETCH 3:1").await, ["BAD FETCH syntax error"]);
    assert_eq!(client.command("FETCH SEEN BOGUS").await, ["BAD FETCH syntax error"]);

    assert_eq!(client.command("FETCH ALL").await.len(), 11);
    assert_eq!(client.command("FETCH DRAFT RECENT").await.len(), 5);
    assert_eq!(client.command("FETCH 4").await.len(), 3);
    assert_eq!(
        client.command("FETCH 40").await,
        ["* No messages found!", "OK FETCH Completed"]
    );
}

#[tokio::test]
async fn test_search() {
    let (mut client, _handle) = logged_in().await;

    assert_eq!(
        client.command("SEARCH SINCE=[2024-01-03]").await,
        ["* SEARCH 3 4 5", "OK SEARCH Completed"]
    );
    assert_eq!(
        client.command("SEARCH UNTIL=[2024-01-02]").await,
        ["* SEARCH 1 2", "OK SEARCH Completed"]
    );
    assert_eq!(
        client.command("SEARCH subject=[project kickoff]").await,
        ["* SEARCH 2", "OK SEARCH Completed"]
    );
    assert_eq!(
        client.command("SEARCH ALL=[nothing like this]").await,
        ["* SEARCH FOUND NO RESULTS", "OK SEARCH Completed"]
    );
    assert_eq!(
        client.command("SEARCH SINCE=2024-01-01").await,
        ["BAD Search value must start with \"[\" and end with \"]\""]
    );
    assert_eq!(
        client.command("SEARCH COLOR=[red]").await,
        ["BAD Search key is not valid!"]
    );
    assert_eq!(
        client.command("SEARCH SINCE=[January]").await,
        ["BAD Parsing Date failed"]
    );
}

#[tokio::test]
async fn test_change_and_expunge() {
    let store = seeded_store().await;
    let (mut client, _handle) = start(Arc::clone(&store), Config::default());
    client.read_until_done().await;
    client.command(&format!("LOGIN {MAILBOX} {PASSWORD}")).await;
    client.command("SELECT").await;

    let welcome = store
        .get_messages(MAILBOX, &mailgate_proto::command::Selection::Uid(1))
        .await
        .unwrap()
        .remove(0);

    assert_eq!(
        client.command("CHANGE abc SEEN").await,
        ["BAD Message must be number!"]
    );
    assert_eq!(
        client.command(&format!("CHANGE {} GONE", welcome.id)).await,
        ["BAD Flag is not valid!"]
    );
    assert_eq!(
        client.command("CHANGE 9999 SEEN").await,
        ["BAD Message ID is not valid!"]
    );
    assert_eq!(
        client.command("CHANGE 1").await,
        ["BAD Parsing Arguments Error!"]
    );
    assert_eq!(
        client
            .command(&format!("CHANGE {} deleted", welcome.id))
            .await,
        ["OK CHANGE Completed"]
    );

    assert_eq!(
        client.command("EXPUNGE now").await,
        ["BAD EXPUNGE command does not accept arguments!"]
    );
    assert_eq!(client.command("EXPUNGE").await, ["OK EXPUNGE Completed"]);
    assert_eq!(
        client.command("SEARCH ALL=[]").await,
        ["* SEARCH 1 2 3 4", "OK SEARCH Completed"]
    );
}

#[tokio::test]
async fn test_help() {
    let (mut client, _handle) = start(seeded_store().await, Config::default());
    client.read_until_done().await;

    let overview = client.command("HELP").await;
    assert_eq!(overview[0], "* MOST COMMANDS ARE ONLY VALID IN CERTAIN STATE!");
    assert_eq!(overview.last().unwrap(), "OK HELP Completed");

    let fetch = client.command("help fetch").await;
    assert_eq!(fetch[0], "* Syntax: FETCH<SP><SEQUENCE><SP><FLAG> | FETCH<SP><FLAG>");

    assert_eq!(
        client.command("HELP BOGUS").await,
        ["BAD Argument is not valid Command!"]
    );
    assert_eq!(
        client.command("HELP FETCH SEARCH").await,
        ["BAD Parsing Arguments Error!"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_sends_notice() {
    let (mut client, handle) = start(seeded_store().await, Config::default());
    client.read_until_done().await;

    assert_eq!(
        client.read_until_done().await,
        ["BAD derby.ac.uk closing connection time out exceeded"]
    );
    let err = handle.await.unwrap().unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_closes_when_peer_stops_reading() {
    // Room for the greeting frame but not for the closing notice.
    let (server, _client) = tokio::io::duplex(40);
    let config = Config::default();
    let idle = config.idle_timeout;
    let session = Session::new(
        server,
        seeded_store().await,
        Arc::new(Handlers::standard()),
        Arc::new(config),
    );
    let handle = tokio::spawn(session.run());

    let limit = idle + NOTICE_WRITE_TIMEOUT + Duration::from_secs(60);
    let finished = tokio::time::timeout(limit, handle)
        .await
        .expect("session stayed open after its idle timeout");
    assert!(matches!(finished.unwrap(), Err(Error::Timeout(d)) if d == idle));
}

#[tokio::test]
async fn test_tcp_server() {
    let config = Config::builder().bind("127.0.0.1:0".parse().unwrap()).build();
    let server = Server::bind(config, seeded_store().await).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();

    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(server.run_until(stopped));

    let stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let mut client = Client::new(stream, Duration::from_secs(5));
    assert_eq!(
        client.read_until_done().await,
        ["OK derby.ac.uk Server running"]
    );
    assert_eq!(registry.len(), 1);
    assert_eq!(client.command("QUIT").await, ["OK QUIT Completed"]);

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();
}
