use std::io::Write;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use wordvec::{normalize, Vectors};

/// number of closest words that will be shown
const N: usize = 40;

#[derive(Parser)]
#[command(about = "interactive nearest-word queries", long_about = None)]
struct Options {
    /// Contains word projections in the BINARY FORMAT.
    #[arg(value_name = "FILE")]
    file_name: PathBuf,
}

fn run(options: Options) -> Result<()> {
    let vectors = Vectors::load(&options.file_name)?;

    let mut line = String::new();
    'outer: loop {
        print!("Enter word or sentence (EXIT to break): ");
        let _ = std::io::stdout().flush();

        line.clear();
        match std::io::stdin().read_line(&mut line) {
            Err(err) => return Err(err).context("error reading stdin"),
            Ok(0) => break,
            Ok(_) => {}
        }
        if line.trim() == "EXIT" {
            break;
        }

        let mut bi: Vec<usize> = vec![];
        for word in line.trim().split(' ') {
            println!();
            print!("Word: {word}  Position in vocabulary: ");
            match vectors.lookup_word(word) {
                None => {
                    println!("None");
                    println!("Out of dictionary word!");
                    continue 'outer;
                }
                Some(i) => {
                    println!("{i}");
                    bi.push(i);
                }
            }
        }

        println!();
        println!("                                              Word       Cosine distance");
        println!("------------------------------------------------------------------------");

        let mut vec = vec![0.0f32; vectors.size()];
        for &i in &bi {
            for (v, r) in vec.iter_mut().zip(vectors[i].iter().copied()) {
                *v += r;
            }
        }
        normalize(&mut vec);

        for (word, dist) in vectors.nearest(&vec, &bi, N) {
            println!("{:>50}\t\t{:8.6}", vectors.word(word), dist);
        }
    }
    Ok(())
}

fn main() {
    let options = Options::parse();
    if let Err(err) = run(options) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}
