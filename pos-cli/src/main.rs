//! Etiqueta sentenças lidas da entrada padrão, uma por linha.

use std::io::{prelude::*, stdin, stdout, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use pos_core::{PerceptronTagger, TaggedWord, TaggerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "postag", about = "Etiquetador POS (averaged perceptron) lendo da entrada padrão.")]
struct Args {
    /// Diretório com weights.json, classes.txt e tags.json
    #[arg(long, default_value = "tagger")]
    model_dir: PathBuf,

    /// Arquivo JSON de configuração (tem precedência sobre --model-dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tabela de pesos (sobrescreve o caminho derivado)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Lista de classes (sobrescreve o caminho derivado)
    #[arg(long)]
    classes: Option<PathBuf>,

    /// Dicionário de tags (sobrescreve o caminho derivado)
    #[arg(long)]
    tags: Option<PathBuf>,

    /// Uma linha JSON por sentença em vez de `palavra tag confiança`
    #[arg(long)]
    json: bool,

    /// Lê toda a entrada e etiqueta as sentenças em paralelo
    #[arg(long)]
    batch: bool,
}

impl Args {
    fn tagger_config(&self) -> Result<TaggerConfig, pos_core::LoadError> {
        let mut config = match &self.config {
            Some(path) => TaggerConfig::from_json_file(path)?,
            None => TaggerConfig::from_dir(&self.model_dir),
        };
        if let Some(p) = &self.weights {
            config.weights_path = p.clone();
        }
        if let Some(p) = &self.classes {
            config.classes_path = p.clone();
        }
        if let Some(p) = &self.tags {
            config.dictionary_path = p.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn write_sentence<W: Write>(out: &mut W, tagged: &[TaggedWord], json: bool) -> std::io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, tagged)?;
        writeln!(out)
    } else {
        for tw in tagged {
            writeln!(out, "{} {} {:.4}", tw.word, tw.tag, tw.confidence)?;
        }
        writeln!(out)
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.tagger_config()?;
    let tagger = PerceptronTagger::from_config(&config)?;

    let mut out = BufWriter::new(stdout().lock());
    let mut n_tokens = 0;
    let start = Instant::now();

    if args.batch {
        let lines = stdin().lock().lines().collect::<Result<Vec<_>, _>>()?;
        for tagged in tagger.annotate_batch(&lines) {
            n_tokens += tagged.len();
            write_sentence(&mut out, &tagged, args.json)?;
        }
    } else {
        let mut buf = vec![];
        for line in stdin().lock().lines() {
            let line = line?;
            let words: Vec<&str> = line.split_whitespace().collect();
            tagger.annotate_into(&words, &mut buf);
            n_tokens += buf.len();
            write_sentence(&mut out, &buf, args.json)?;
        }
    }
    out.flush()?;

    let elapsed = start.elapsed().as_secs_f64();
    info!(n_tokens, elapsed_sec = elapsed, "etiquetagem concluída");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths_override_model_dir() {
        let args = Args::parse_from(["postag", "--model-dir", "m", "--tags", "other/dict.json"]);
        let config = args.tagger_config().unwrap();
        assert_eq!(config.weights_path, PathBuf::from("m").join("weights.json"));
        assert_eq!(config.dictionary_path, PathBuf::from("other/dict.json"));
    }

    #[test]
    fn test_plain_output_format() {
        let tagged = vec![TaggedWord {
            word: "dog".to_string(),
            tag: "NOUN".to_string(),
            confidence: 0.5,
            source: pos_core::TagSource::Model,
        }];
        let mut out = vec![];
        write_sentence(&mut out, &tagged, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "dog NOUN 0.5000\n\n");
    }
}
