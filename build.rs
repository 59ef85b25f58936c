use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Create config template if it doesn't exist
    let out_dir = env::var("OUT_DIR").unwrap_or_else(|_| "./".to_string());
    let template_path = Path::new(&out_dir).join("../../../tsmux.template.toml");

    let template = r#"# TSMUX Configuration Template
# Copy this file to 'tsmux.toml' and adjust the values

# Elementary stream PIDs
video_pid = 256
audio_pid = 257
pmt_pid = 4095

# Minimum spacing between PCR samples, in milliseconds
pcr_interval_ms = 20

# Spacing between PAT/PMT insertions, in milliseconds
psi_interval_ms = 2000

# Media that must be configured before anything is written: video, audio or both
expected_media = "both"
"#;

    if !template_path.exists() {
        let _ = fs::write(template_path, template);
    }
    println!("cargo:rerun-if-changed=build.rs");
}
