//! Reply text for every command, plus the free-text trigger table.
//!
//! All output is Telegram HTML. Anything the user typed goes through
//! [`escape_html`] before it is echoed back.

use crate::{
    domain::Sender,
    ports::Connectivity,
    stats::StatsReport,
};

/// Free-text triggers, matched against the whole message (lowercased, trimmed).
pub const FREE_TEXT_TRIGGERS: &[(&str, &str)] = &[
    ("hello", "Hello! 👋 How is your DevOps learning going?"),
    ("how are you", "Great! Learning DevOps together! 🚀"),
    ("docker", "Docker is a great technology! Use /docker for details"),
    ("kubernetes", "Kubernetes is powerful! Try /k8s"),
    ("devops", "DevOps is a culture and a set of practices! 💪"),
];

const COMMAND_LIST: &str = "/start - Get started\n\
/status - System status\n\
/stats - Bot statistics\n\
/docker - About Docker\n\
/k8s - About Kubernetes\n\
/help - Help";

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn welcome(sender: &Sender) -> String {
    let name = escape_html(sender.greeting_name());
    format!(
        "🤖 <b>DevOps Learning Bot</b>\n\n\
Hi, {name}!\n\n\
I'll help you learn DevOps. Available commands:\n\n\
{COMMAND_LIST}\n\n\
Send me any message and I'll reply!"
    )
}

pub fn help() -> String {
    format!("📋 <b>Commands</b>\n\n{COMMAND_LIST}\n\nAny other text gets a short reply.")
}

pub fn status(conn: Connectivity) -> String {
    let label = |up: bool| if up { "✅ Connected" } else { "❌ Disconnected" };
    format!(
        "📊 <b>System status</b>\n\n\
🔴 Redis: {}\n\
🗄️ MySQL: {}\n\n\
🤖 Bot version: {}",
        label(conn.cache),
        label(conn.durable),
        env!("CARGO_PKG_VERSION"),
    )
}

pub fn stats(report: &StatsReport) -> String {
    let StatsReport::Ready(s) = report else {
        return "❌ Database unavailable".to_string();
    };

    let mut out = format!(
        "📈 <b>Bot statistics</b>\n\n\
👥 Unique users: {}\n\
💬 Total messages: {}\n\n\
🔥 Top commands:\n",
        s.unique_users, s.total_messages
    );
    if s.top_commands.is_empty() {
        out.push_str("none yet\n");
    }
    for c in &s.top_commands {
        let times = if c.count == 1 { "time" } else { "times" };
        out.push_str(&format!("/{}: {} {times}\n", escape_html(&c.name), c.count));
    }
    out
}

pub fn docker() -> String {
    "🐳 <b>Docker</b>\n\n\
Docker is a containerization platform that lets you:\n\
- package applications into containers\n\
- isolate processes\n\
- simplify deployment\n\
- keep environments consistent\n\n\
Key commands:\n\
<code>docker run</code> - start a container\n\
<code>docker ps</code> - list containers\n\
<code>docker build</code> - build an image\n\
<code>docker-compose up</code> - start a stack"
        .to_string()
}

pub fn k8s() -> String {
    "☸️ <b>Kubernetes</b>\n\n\
Kubernetes orchestrates containers:\n\
- automatic scaling\n\
- service discovery\n\
- load balancing\n\
- rolling updates\n\
- self-healing\n\n\
Core objects:\n\
<code>Pod</code> - smallest deployable unit\n\
<code>Service</code> - network access to pods\n\
<code>Deployment</code> - manages replicas\n\
<code>ConfigMap</code> - application configuration"
        .to_string()
}

/// Canned reply for a trigger phrase, or an echo of the input.
pub fn free_text(text: &str) -> String {
    let key = text.trim().to_lowercase();
    if let Some((_, reply)) = FREE_TEXT_TRIGGERS.iter().find(|(t, _)| *t == key) {
        return reply.to_string();
    }
    format!(
        "Got your message: '{}'. Use /help for the list of commands!",
        escape_html(text)
    )
}
