// ABOUTME: Demo application composing an m-send-req PDU from command line arguments
// ABOUTME: Reads attachments from disk and writes the encoded PDU to a file for inspection

pub(crate) use argh::FromArgs;
use send_message::pdu::{MessagePart, PduBuilder};
use std::error::Error;
use std::path::Path;

/// Compose an MMS send request and write the encoded PDU
#[derive(FromArgs)]
struct CliArgs {
    /// whether or not to enable debugging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the recipient address, may be repeated
    #[argh(option, short = 't')]
    to: Vec<String>,

    /// the sender address (default: inserted by the relay)
    #[argh(option, short = 'f')]
    from: Option<String>,

    /// the message subject
    #[argh(option, short = 's')]
    subject: Option<String>,

    /// the message text
    #[argh(option, short = 'm')]
    message: Option<String>,

    /// a file to attach, may be repeated
    #[argh(option, short = 'a')]
    attach: Vec<String>,

    /// where to write the PDU (default: send_req.pdu)
    #[argh(option, short = 'o')]
    out: Option<String>,
}

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("3gp") => "video/3gpp",
        Some("amr") => "audio/amr",
        Some("mp3") => "audio/mpeg",
        Some("vcf") => "text/x-vcard",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();

    let level = if cli_args.debugging {
        Level::TRACE
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut parts = Vec::new();
    for file in &cli_args.attach {
        let path = Path::new(file);
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.clone());
        parts.push(MessagePart::new(name, mime_type_for(path), data).with_filename(file.clone()));
    }
    if let Some(text) = cli_args.message.filter(|text| !text.is_empty()) {
        parts.push(MessagePart::new("text", "text/plain", text.into_bytes()));
    }

    let composed = PduBuilder::new()
        .compose(
            cli_args.from.as_deref(),
            &cli_args.to,
            &parts,
            cli_args.subject.as_deref(),
        )
        .map_err(|e| {
            eprintln!("Compose failed: {e}");
            Box::<dyn Error>::from(e.to_string())
        })?;

    let out = cli_args.out.unwrap_or_else(|| "send_req.pdu".to_owned());
    tokio::fs::write(&out, &composed.bytes).await?;

    println!(
        "Wrote {} bytes to {out}: {} recipient(s), {} part(s), message size {}",
        composed.bytes.len(),
        composed.request.to.len(),
        composed.request.body.len(),
        composed.request.message_size,
    );

    Ok(())
}
