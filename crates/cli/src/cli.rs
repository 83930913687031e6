use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pdf-p12-sign",
    version,
    about = "Sign a PDF with a PKCS#12 certificate container",
    long_about = "Sign a PDF with a PKCS#12 certificate container.\n\n\
        The certificate and signature fields come from the environment:\n  \
        CERT_CONTAINER_PATH      PKCS#12 file (default: /app/certs/default.p12)\n  \
        CERT_CONTAINER_PASSWORD  PKCS#12 password (default: empty)\n  \
        SIGN_REASON              signature reason\n  \
        SIGN_LOCATION            signature location\n  \
        SIGN_CONTACT             signer contact info (default: empty)\n\n\
        Exit codes: 0 ok, 1 bad arguments or missing input, 2 certificate not found,\n\
        3 certificate unreadable, 4 signing failed."
)]
pub struct Cli {
    /// Path to the PDF file to sign
    #[arg(value_name = "INPUT.pdf")]
    pub input: PathBuf,

    /// Path the signed PDF is written to
    #[arg(value_name = "OUTPUT.pdf")]
    pub output: PathBuf,
}
