//! Command implementations.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::extract::{PopplerRasterizer, TextExtractor, DOCX_MIME};
use crate::llm::AnalysisClient;
use crate::ocr::TextDetector;

/// Detect the document MIME type from content, falling back to the extension.
fn detect_mime(path: &Path) -> anyhow::Result<String> {
    if let Some(kind) = infer::get_from_path(path)? {
        // DOCX containers are sometimes only recognized as plain zip
        if kind.mime_type() != "application/zip" {
            return Ok(kind.mime_type().to_string());
        }
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "docx" => DOCX_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        other => anyhow::bail!("unsupported file type: {:?}", other),
    };
    Ok(mime.to_string())
}

/// Build the configured detection backend.
fn build_detector(settings: &Settings) -> Arc<dyn TextDetector> {
    #[cfg(feature = "ocr-paddle")]
    {
        use crate::ocr::PaddleDetector;
        let model_dir = settings
            .ocr
            .model_dir
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("models/paddle-ocr"));
        return Arc::new(PaddleDetector::new(model_dir));
    }

    #[cfg(not(feature = "ocr-paddle"))]
    {
        let _ = settings;
        Arc::new(crate::ocr::UnavailableDetector)
    }
}

fn extract_text(settings: &Settings, file: &Path) -> anyhow::Result<String> {
    let mime = detect_mime(file)?;
    let extractor = TextExtractor::new(build_detector(settings));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("valid template"));
    spinner.set_message(format!("Extracting text from {}", file.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = extractor.extract(file, &mime);
    spinner.finish_and_clear();

    Ok(result?)
}

pub fn cmd_extract(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let text = extract_text(settings, file)?;
    println!("{}", text);
    Ok(())
}

pub async fn cmd_analyze(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let text = extract_text(settings, file)?;

    println!("\n{}", style("Extracted text").bold());
    println!("{}", "-".repeat(50));
    println!("{}\n", text);

    let client = AnalysisClient::new(settings.analysis.clone());
    let (reply, _state) = client.analyze(&text, None).await?;

    println!("{}", style("Analysis").bold());
    println!("{}", "-".repeat(50));
    println!("{}", reply);
    Ok(())
}

pub async fn cmd_chat(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let text = extract_text(settings, file)?;

    let client = AnalysisClient::new(settings.analysis.clone());
    let (reply, mut state) = client.analyze(&text, None).await?;

    println!("\n{}", style("Analysis").bold());
    println!("{}", "-".repeat(50));
    println!("{}\n", reply);
    println!("{}", style("Ask follow-up questions (empty line or 'exit' to quit)").dim());

    loop {
        print!("{} ", style(">").cyan());
        io::stdout().flush()?;

        let mut question = String::new();
        if io::stdin().read_line(&mut question)? == 0 {
            break; // EOF
        }
        let question = question.trim();
        if question.is_empty() || question == "exit" || question == "quit" {
            break;
        }

        // Hand the state back only on success so a failed turn can be retried
        match client.analyze(question, Some(state.clone())).await {
            Ok((reply, new_state)) => {
                state = new_state;
                println!("\n{}\n", reply);
            }
            Err(e) => {
                eprintln!("{} {}", style("error:").red(), e);
            }
        }
    }

    Ok(())
}

pub fn cmd_check(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let pdftoppm = PopplerRasterizer::is_available();
    let pdftoppm_status = if pdftoppm {
        style("✓ found").green()
    } else {
        style("✗ not found").red()
    };
    println!("  {:<15} {}", "pdftoppm", pdftoppm_status);
    if !pdftoppm {
        println!(
            "                  {}",
            style("Install with: apt install poppler-utils").dim()
        );
    }

    let detector = build_detector(settings);
    let detector_status = if detector.is_available() {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<15} {}", "OCR backend", detector_status);
    println!("                  {}", style(detector.availability_hint()).dim());

    println!("\n{}", style("Analysis endpoint").bold());
    println!("{}", "-".repeat(50));
    println!("  endpoint: {}", settings.analysis.endpoint);
    println!("  model:    {}", settings.analysis.model);
    let key_status = if settings.analysis.api_key.is_some() {
        style("configured").green()
    } else {
        style("not set (export ANALYSIS_API_KEY or DEEPSEEK_API_KEY)").yellow()
    };
    println!("  api key:  {}", key_status);

    Ok(())
}
