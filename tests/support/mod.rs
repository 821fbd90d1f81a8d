//! In-process FTP server backed by an in-memory tree.
//!
//! Speaks just enough RFC 959 for the FTP engine: login, FEAT, TYPE,
//! CWD, PASV/EPSV, MLSD or LIST, RETR, STOR and QUIT, plus explicit
//! FTPS (AUTH TLS, PBSZ, PROT) with a self-signed certificate when
//! started through [`ScriptedFtp::start_tls`]. Every command line
//! received is recorded.

#![allow(dead_code)]

use csync_core::{EngineDescriptor, FsError, FsResult};
use csync_sftp::{DirReader, RemoteKind};
use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

pub const USERNAME: &str = "mc";
pub const PASSWORD: &str = "secret";

/// Self-signed P-256 certificate for `localhost` / `127.0.0.1`.
const CERT_DER: &[u8] = include_bytes!("localhost.cert.der");
const KEY_DER: &[u8] = include_bytes!("localhost.key.der");

fn clean(path: &str) -> String {
    path.split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(p, _)| p).unwrap_or("")
}

fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, n)| n).unwrap_or(path)
}

/// Files and directories the server exposes. The root is always present.
#[derive(Default, Clone)]
pub struct MemTree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl MemTree {
    pub fn dir(&mut self, path: &str) -> &mut Self {
        let mut current = clean(path);
        while !current.is_empty() {
            let parent = parent_of(&current).to_string();
            self.dirs.insert(current);
            current = parent;
        }
        self
    }

    pub fn file(&mut self, path: &str, contents: &str) -> &mut Self {
        let path = clean(path);
        self.dir(parent_of(&path));
        self.files.insert(path, contents.as_bytes().to_vec());
        self
    }

    /// Write the same files and directories below `root`.
    pub fn materialize(&self, root: &Path) {
        for dir in &self.dirs {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
        for (file, data) in &self.files {
            std::fs::write(root.join(file), data).unwrap();
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path)
    }

    fn listing(&self, dir: &str, mlsd: bool) -> Option<String> {
        if !self.is_dir(dir) {
            return None;
        }
        let mut out = String::new();
        if mlsd {
            out.push_str(&format!("type=cdir;modify=20240101120000; /{}\r\n", dir));
        } else {
            out.push_str("total 0\r\n");
        }
        for d in self.dirs.iter().filter(|d| parent_of(d) == dir) {
            if mlsd {
                out.push_str(&format!("type=dir;modify=20240101120000; {}\r\n", name_of(d)));
            } else {
                out.push_str(&format!(
                    "drwxr-xr-x   2 mc mc  4096 Jan  1 12:00 {}\r\n",
                    name_of(d)
                ));
            }
        }
        for (f, data) in self.files.iter().filter(|(f, _)| parent_of(f) == dir) {
            if mlsd {
                out.push_str(&format!(
                    "type=file;size={};modify=20240101120000; {}\r\n",
                    data.len(),
                    name_of(f)
                ));
            } else {
                out.push_str(&format!(
                    "-rw-r--r--   1 mc mc  {} Jan  1 12:00 {}\r\n",
                    data.len(),
                    name_of(f)
                ));
            }
        }
        Some(out)
    }
}

/// The tree as an SFTP server would list it.
impl DirReader for MemTree {
    fn read_dir(&self, dir: &str) -> FsResult<Vec<(String, RemoteKind)>> {
        let dir = clean(dir);
        if !self.is_dir(&dir) {
            return Err(FsError::not_found(format!("{}: no such directory", dir)).with_path(dir));
        }
        let mut out: Vec<(String, RemoteKind)> = self
            .dirs
            .iter()
            .filter(|d| parent_of(d) == dir)
            .map(|d| (name_of(d).to_string(), RemoteKind::Directory))
            .chain(
                self.files
                    .keys()
                    .filter(|f| parent_of(f) == dir)
                    .map(|f| (name_of(f).to_string(), RemoteKind::File)),
            )
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

struct State {
    tree: MemTree,
    log: Vec<String>,
    mlsd: bool,
    tls_transfers: usize,
}

fn acceptor() -> TlsAcceptor {
    let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(
            vec![CertificateDer::from(CERT_DER.to_vec())],
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(KEY_DER.to_vec())),
        )
        .unwrap();
    // Clients close data connections without reading; an unread ticket
    // would turn that close into a reset.
    config.send_tls13_tickets = 0;
    TlsAcceptor::from(Arc::new(config))
}

/// Handle to a running server. Dropping it leaves the server task running
/// until the test runtime shuts down.
#[derive(Clone)]
pub struct ScriptedFtp {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
}

impl ScriptedFtp {
    /// Server advertising MLSD. `AUTH TLS` is refused.
    pub async fn start(tree: MemTree) -> Self {
        Self::spawn(tree, true, None).await
    }

    /// Server without MLSD, so clients fall back to `LIST`.
    pub async fn start_list_only(tree: MemTree) -> Self {
        Self::spawn(tree, false, None).await
    }

    /// Explicit FTPS server: accepts `AUTH TLS` and protects data
    /// connections after `PROT P`.
    pub async fn start_tls(tree: MemTree) -> Self {
        Self::spawn(tree, true, Some(acceptor())).await
    }

    async fn spawn(tree: MemTree, mlsd: bool, tls: Option<TlsAcceptor>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            tree,
            log: Vec::new(),
            mlsd,
            tls_transfers: 0,
        }));
        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = shared.clone();
                let tls = tls.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, state, tls).await;
                });
            }
        });
        Self { addr, state }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Descriptor with working credentials.
    pub fn descriptor(&self) -> EngineDescriptor {
        EngineDescriptor {
            address: "127.0.0.1".into(),
            port: Some(self.port()),
            username: USERNAME.into(),
            password: PASSWORD.into(),
            ..Default::default()
        }
    }

    /// Command lines received so far, across all connections.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .count()
    }

    /// Data connections that completed a TLS handshake.
    pub fn tls_transfers(&self) -> usize {
        self.state.lock().unwrap().tls_transfers
    }

    pub fn file(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .tree
            .files
            .get(&clean(path))
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

trait Conn: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Conn for T {}

async fn reply<W: AsyncWrite + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\r\n").await?;
    out.flush().await
}

fn resolve(cwd: &str, arg: &str) -> String {
    if arg.starts_with('/') {
        clean(arg)
    } else {
        clean(&format!("{}/{}", cwd, arg))
    }
}

async fn serve(
    stream: TcpStream,
    state: Arc<Mutex<State>>,
    tls: Option<TlsAcceptor>,
) -> std::io::Result<()> {
    let mut control: BufReader<Box<dyn Conn>> = BufReader::new(Box::new(stream));
    let mut cwd = String::new();
    let mut passive: Option<TcpListener> = None;
    let mut protect = false;

    reply(control.get_mut(), "220 clubsync test server ready").await?;

    loop {
        let mut raw = String::new();
        if control.read_line(&mut raw).await? == 0 {
            break;
        }
        let line = raw.trim_end().to_string();
        let (verb, arg) = match line.split_once(' ') {
            Some((v, a)) => (v.to_ascii_uppercase(), a.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };
        let mlsd = {
            let mut s = state.lock().unwrap();
            s.log.push(line.clone());
            s.mlsd
        };
        let out = control.get_mut();

        match verb.as_str() {
            "AUTH" => match &tls {
                Some(acceptor) if arg.eq_ignore_ascii_case("TLS") => {
                    reply(out, "234 Proceed with negotiation").await?;
                    let plain = control.into_inner();
                    let secured = acceptor.accept(plain).await?;
                    control = BufReader::new(Box::new(secured));
                }
                _ => reply(out, "502 AUTH not supported").await?,
            },
            "PBSZ" => reply(out, "200 PBSZ=0").await?,
            "PROT" => {
                protect = arg.eq_ignore_ascii_case("P");
                reply(out, "200 Protection level set").await?
            }
            "USER" => reply(out, "331 Password required").await?,
            "PASS" if arg == PASSWORD => reply(out, "230 Logged in").await?,
            "PASS" => reply(out, "530 Login incorrect").await?,
            "FEAT" => {
                let body = if mlsd {
                    "211-Features:\r\n MLSD\r\n SIZE\r\n UTF8\r\n EPSV\r\n211 End"
                } else {
                    "211-Features:\r\n UTF8\r\n211 End"
                };
                reply(out, body).await?
            }
            "OPTS" | "TYPE" => reply(out, "200 OK").await?,
            "CWD" => {
                let target = resolve(&cwd, &arg);
                let exists = state.lock().unwrap().tree.is_dir(&target);
                if exists {
                    cwd = target;
                    reply(out, "250 Directory changed").await?
                } else {
                    reply(out, "550 No such file or directory").await?
                }
            }
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                passive = Some(listener);
                reply(
                    out,
                    &format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{})",
                        port / 256,
                        port % 256
                    ),
                )
                .await?
            }
            "EPSV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                passive = Some(listener);
                reply(out, &format!("229 Entering Extended Passive Mode (|||{}|)", port)).await?
            }
            "MLSD" | "LIST" | "RETR" | "STOR" => {
                let Some(listener) = passive.take() else {
                    reply(out, "425 Use PASV first").await?;
                    continue;
                };
                let path = resolve(&cwd, &arg);
                let data_tls = if protect { tls.as_ref() } else { None };
                transfer(&verb, &path, listener, out, &state, data_tls).await?
            }
            "QUIT" => {
                reply(out, "221 Goodbye").await?;
                break;
            }
            _ => reply(out, "502 Command not implemented").await?,
        }
    }
    Ok(())
}

async fn transfer<W: AsyncWrite + Unpin>(
    verb: &str,
    path: &str,
    listener: TcpListener,
    out: &mut W,
    state: &Arc<Mutex<State>>,
    tls: Option<&TlsAcceptor>,
) -> std::io::Result<()> {
    let payload = {
        let s = state.lock().unwrap();
        match verb {
            "RETR" => s.tree.files.get(path).cloned(),
            "MLSD" => s.tree.listing(path, true).map(String::into_bytes),
            "LIST" => s.tree.listing(path, false).map(String::into_bytes),
            _ => {
                if s.tree.is_dir(parent_of(path)) {
                    Some(Vec::new())
                } else {
                    None
                }
            }
        }
    };

    let Some(payload) = payload else {
        return reply(out, &format!("550 {}: No such file or directory", path)).await;
    };

    reply(out, "150 Opening BINARY mode data connection").await?;
    let (tcp, _) = listener.accept().await?;
    let mut data: Box<dyn Conn> = match tls {
        Some(acceptor) => {
            let secured = acceptor.accept(tcp).await?;
            state.lock().unwrap().tls_transfers += 1;
            Box::new(secured)
        }
        None => Box::new(tcp),
    };
    if verb == "STOR" {
        let mut received = Vec::new();
        data.read_to_end(&mut received).await?;
        state
            .lock()
            .unwrap()
            .tree
            .files
            .insert(path.to_string(), received);
    } else {
        data.write_all(&payload).await?;
        data.shutdown().await?;
    }
    drop(data);
    reply(out, "226 Transfer complete").await
}
