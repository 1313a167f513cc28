//! Service classification by port number and banner.
//!
//! Labels come from three tiers, tried in order:
//! 1. a fixed table of well-known services with display names,
//! 2. the system services database (`/etc/services`, TCP entries),
//! 3. `"Unknown"`.
//!
//! A non-empty banner is appended to whichever label was resolved.

use std::collections::HashMap;
use std::fs;
use std::sync::LazyLock;

/// Label for ports outside `0-65535`.
pub const INVALID_PORT: &str = "Invalid Port";

/// Label when no tier resolves the port.
pub const UNKNOWN: &str = "Unknown";

/// Number of banner characters appended to a label.
const BANNER_PREFIX_CHARS: usize = 30;

const SYSTEM_SERVICES_PATH: &str = "/etc/services";

/// Well-known services, checked before the system database.
const WELL_KNOWN: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (5900, "VNC"),
    (6379, "Redis"),
    (8080, "HTTP-Proxy"),
    (27017, "MongoDB"),
];

/// Embedded stand-in for hosts without a services database.
const FALLBACK_SERVICES: &[(u16, &str)] = &[
    (7, "echo"),
    (20, "ftp-data"),
    (37, "time"),
    (43, "whois"),
    (67, "bootps"),
    (68, "bootpc"),
    (69, "tftp"),
    (79, "finger"),
    (88, "kerberos"),
    (111, "sunrpc"),
    (113, "auth"),
    (119, "nntp"),
    (123, "ntp"),
    (135, "epmap"),
    (137, "netbios-ns"),
    (138, "netbios-dgm"),
    (139, "netbios-ssn"),
    (161, "snmp"),
    (162, "snmp-trap"),
    (179, "bgp"),
    (389, "ldap"),
    (465, "submissions"),
    (514, "shell"),
    (515, "printer"),
    (554, "rtsp"),
    (587, "submission"),
    (631, "ipp"),
    (636, "ldaps"),
    (873, "rsync"),
    (993, "imaps"),
    (995, "pop3s"),
    (1080, "socks"),
    (1194, "openvpn"),
    (1433, "ms-sql-s"),
    (1521, "ncube-lm"),
    (1723, "pptp"),
    (1812, "radius"),
    (1883, "mqtt"),
    (2049, "nfs"),
    (2181, "zookeeper"),
    (3260, "iscsi-target"),
    (4369, "epmd"),
    (5060, "sip"),
    (5222, "xmpp-client"),
    (5269, "xmpp-server"),
    (5672, "amqp"),
    (6667, "ircd"),
    (8443, "https-alt"),
    (9418, "git"),
    (11211, "memcache"),
];

static CLASSIFIER: LazyLock<ServiceClassifier> = LazyLock::new(ServiceClassifier::from_system);

/// Maps ports (and optional banners) to human-readable service labels.
///
/// Both tables are built once and only read afterwards.
#[derive(Debug, Clone)]
pub struct ServiceClassifier {
    well_known: HashMap<u16, &'static str>,
    system: HashMap<u16, String>,
}

impl ServiceClassifier {
    /// Build a classifier backed by the given system service table.
    pub fn with_system_table(system: HashMap<u16, String>) -> Self {
        Self {
            well_known: WELL_KNOWN.iter().copied().collect(),
            system,
        }
    }

    /// Build a classifier from the host's services database, falling back to
    /// the embedded table when it cannot be read.
    pub fn from_system() -> Self {
        let system = match fs::read_to_string(SYSTEM_SERVICES_PATH) {
            Ok(content) => {
                let table = parse_services_db(&content);
                tracing::debug!(entries = table.len(), "loaded {}", SYSTEM_SERVICES_PATH);
                table
            }
            Err(e) => {
                tracing::debug!("{} unavailable ({}), using embedded table", SYSTEM_SERVICES_PATH, e);
                fallback_table()
            }
        };
        Self::with_system_table(system)
    }

    /// Resolve the label for `port`, decorated with a banner prefix when one
    /// is supplied.
    pub fn classify(&self, port: u32, banner: &str) -> String {
        let Ok(port) = u16::try_from(port) else {
            return INVALID_PORT.to_string();
        };

        let label = self
            .well_known
            .get(&port)
            .copied()
            .or_else(|| self.system.get(&port).map(String::as_str))
            .unwrap_or(UNKNOWN);

        if banner.is_empty() {
            label.to_string()
        } else {
            let prefix: String = banner.chars().take(BANNER_PREFIX_CHARS).collect();
            format!("{} ({})", label, prefix)
        }
    }
}

impl Default for ServiceClassifier {
    fn default() -> Self {
        Self::with_system_table(fallback_table())
    }
}

/// Classify with the process-wide classifier.
pub fn classify(port: u32, banner: &str) -> String {
    CLASSIFIER.classify(port, banner)
}

/// Label for a bare port, no banner.
pub fn service_name(port: u32) -> String {
    classify(port, "")
}

fn fallback_table() -> HashMap<u16, String> {
    FALLBACK_SERVICES
        .iter()
        .map(|&(port, name)| (port, name.to_string()))
        .collect()
}

/// Parse `/etc/services`-formatted text, keeping the first TCP name per port.
///
/// Lines look like `ssh  22/tcp  # SSH Remote Login Protocol`.
pub fn parse_services_db(content: &str) -> HashMap<u16, String> {
    let mut table = HashMap::new();

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let mut fields = line.split_whitespace();
        let (Some(name), Some(port_proto)) = (fields.next(), fields.next()) else {
            continue;
        };
        let Some((port, proto)) = port_proto.split_once('/') else {
            continue;
        };
        if !proto.eq_ignore_ascii_case("tcp") {
            continue;
        }
        if let Ok(port) = port.parse::<u16>() {
            table.entry(port).or_insert_with(|| name.to_string());
        }
    }

    table
}
