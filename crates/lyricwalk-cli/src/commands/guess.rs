use anyhow::{anyhow, bail, Context as _, Result};
use lyricwalk_core::model::Category;
use lyricwalk_game::{new_seed, Challenge, GuessEngine, GuessResult, OPTION_COUNT};
use serde::Serialize;
use std::io::{self, BufRead, Write};

use super::{print_json, Context};

/// A challenge as printed with `--json`, with the seed that rebuilds it.
#[derive(Debug, Serialize)]
struct SeededChallenge<'a> {
    seed: u64,
    #[serde(flatten)]
    challenge: &'a Challenge,
}

pub async fn run_guess(
    ctx: &Context,
    category: Category,
    id: i64,
    seed: Option<u64>,
    answer: Option<usize>,
) -> Result<()> {
    let engine = GuessEngine::new(ctx.store.clone());
    let song = ctx.store.get_song(id, category).await?;

    if !song.is_collected {
        bail!("{} song {} has not been collected yet", category, id);
    }
    if song.is_guessed {
        println!("Already guessed: {} / {}", song.title, song.artist);
        return Ok(());
    }

    let seed = seed.unwrap_or_else(new_seed);
    let challenge = engine.build_challenge(&song, seed).await?;

    if let Some(answer) = answer {
        let chosen = to_index(answer)?;
        let result = engine
            .submit_answer(&song, chosen, challenge.correct_index)
            .await?;
        if ctx.json {
            return print_json(&result);
        }
        print_result(result);
        if result == GuessResult::Incorrect {
            println!("Answer again with --seed {seed} --answer N.");
        }
        return Ok(());
    }

    if ctx.json {
        return print_json(&SeededChallenge {
            seed,
            challenge: &challenge,
        });
    }

    print_challenge(&challenge, seed);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nYour answer (1-{OPTION_COUNT}, q to quit): ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("Failed to read answer")?;
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let parsed = input.parse::<usize>().ok().and_then(|n| to_index(n).ok());
        let chosen = match parsed {
            Some(chosen) if chosen < OPTION_COUNT => chosen,
            _ => {
                println!("Please enter a number from 1 to {OPTION_COUNT}.");
                continue;
            }
        };

        let result = engine
            .submit_answer(&song, chosen, challenge.correct_index)
            .await?;
        print_result(result);
        if result == GuessResult::Correct {
            return Ok(());
        }
    }
}

/// Options are numbered from 1 on the command line.
fn to_index(answer: usize) -> Result<usize> {
    answer
        .checked_sub(1)
        .ok_or_else(|| anyhow!("Options are numbered 1 to {}", OPTION_COUNT))
}

fn print_challenge(challenge: &Challenge, seed: u64) {
    println!("\n🎤 \"{}\"\n", challenge.lyric);
    for (i, option) in challenge.options.iter().enumerate() {
        println!("  {}) {}", i + 1, option.replacen('\n', " / ", 1));
    }
    println!("\n  (seed {seed}: answer later with --seed {seed} --answer N)");
}

fn print_result(result: GuessResult) {
    match result {
        GuessResult::Correct => println!("\n✓ Correct!"),
        GuessResult::Incorrect => println!("\n✗ Not quite. Try again."),
    }
}
