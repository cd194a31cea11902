use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use superlotto_db::models::{Draw, Zone};
use superlotto_engine::ensemble::Consensus;
use superlotto_engine::frequency::NumberFrequency;
use superlotto_engine::markov::{ForecastBasis, MarkovForecast, MarkovModel};
use superlotto_engine::patterns::{PatternAnalysis, PatternPayload};
use superlotto_engine::predict::{Factor, Prediction, PredictionOutcome};
use superlotto_engine::suggestions::Grid;

use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("No draws to display.");
        return;
    }

    let mut table = new_table(vec!["Issue", "Date", "Front", "Back", "Jackpot", "Winners"]);
    for draw in draws {
        let mut back = draw.back;
        back.sort_unstable();
        let jackpot = draw
            .jackpot_amount
            .map(|a| format!("{:.0}", a))
            .unwrap_or_else(|| "-".to_string());
        let winners = draw
            .winners_count
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            draw.draw_number.clone(),
            draw.date.to_string(),
            join_numbers(&draw.sorted_front()),
            join_numbers(&back),
            jackpot,
            winners,
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Records read       : {}", result.total_records);
    println!("  Inserted           : {}", result.inserted);
    println!("  Duplicates skipped : {}", result.skipped);
    if result.errors > 0 {
        println!("  Errors             : {}", result.errors);
    }
}

pub fn display_frequency(front: &[NumberFrequency], back: &[NumberFrequency], window_days: i64) {
    println!("\nFrequency statistics over the last {} days\n", window_days);
    println!("-- Front zone (1-35) --");
    frequency_table(front);
    println!("\n-- Back zone (1-12) --");
    frequency_table(back);
}

fn frequency_table(records: &[NumberFrequency]) {
    let mut table = new_table(vec![
        "Number", "Freq", "Last seen", "Gap", "Avg gap", "Hot", "Cold", "Tag",
    ]);

    // Top fifth by hot score is tagged HOT, top fifth by cold score COLD.
    let tag_count = (records.len() / 5).max(1);
    let mut by_hot: Vec<&NumberFrequency> = records.iter().collect();
    by_hot.sort_by(|a, b| {
        b.hot_score
            .partial_cmp(&a.hot_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let hot: Vec<u8> = by_hot.iter().take(tag_count).map(|r| r.number).collect();
    let mut by_cold: Vec<&NumberFrequency> = records.iter().collect();
    by_cold.sort_by(|a, b| {
        b.cold_score
            .partial_cmp(&a.cold_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let cold: Vec<u8> = by_cold.iter().take(tag_count).map(|r| r.number).collect();

    let mut sorted: Vec<&NumberFrequency> = records.iter().collect();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for record in sorted {
        let (tag, color) = if hot.contains(&record.number) {
            ("HOT", Color::Green)
        } else if cold.contains(&record.number) {
            ("COLD", Color::Red)
        } else {
            ("", Color::White)
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", record.number)),
            Cell::new(record.frequency.to_string()),
            Cell::new(
                record
                    .last_seen
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "never".to_string()),
            ),
            Cell::new(record.current_gap.to_string()),
            Cell::new(format!("{:.1}", record.average_gap)),
            Cell::new(format!("{:.3}", record.hot_score)),
            Cell::new(format!("{:.3}", record.cold_score)),
            Cell::new(tag).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_pattern(analysis: &PatternAnalysis) {
    println!(
        "\nPattern: {} (sample {}, confidence {:.2}{})",
        analysis.pattern,
        analysis.sample_size,
        analysis.confidence,
        if analysis.low_confidence {
            ", LOW CONFIDENCE"
        } else {
            ""
        }
    );

    match &analysis.payload {
        PatternPayload::Consecutive {
            pair_histogram,
            draws_with_consecutive,
            share_with_consecutive,
        } => {
            let mut table = new_table(vec!["Consecutive pairs", "Draws"]);
            for (pairs, count) in pair_histogram.iter().enumerate() {
                table.add_row(vec![pairs.to_string(), count.to_string()]);
            }
            println!("{table}");
            println!(
                "Draws with at least one consecutive pair: {} ({:.1}%)",
                draws_with_consecutive,
                share_with_consecutive * 100.0
            );
        }
        PatternPayload::OddEven {
            odd_histogram,
            modal_odd_count,
            modal_share,
        } => {
            let mut table = new_table(vec!["Odd count", "Draws"]);
            for (odd, count) in odd_histogram.iter().enumerate() {
                table.add_row(vec![odd.to_string(), count.to_string()]);
            }
            println!("{table}");
            println!(
                "Most common split: {} odd / {} even ({:.1}% of draws)",
                modal_odd_count,
                5 - modal_odd_count,
                modal_share * 100.0
            );
        }
        PatternPayload::SumRanges { bands, mean, std_dev } => {
            let mut table = new_table(vec!["Band", "Range", "Draws", "Share"]);
            for band in bands {
                table.add_row(vec![
                    band.label.to_string(),
                    format!("{}-{}", band.min, band.max),
                    band.count.to_string(),
                    format!("{:.1}%", band.share * 100.0),
                ]);
            }
            println!("{table}");
            println!("Mean sum {:.1}, std dev {:.1}", mean, std_dev);
        }
        PatternPayload::GapPatterns { numbers } => {
            let mut table = new_table(vec![
                "Number", "Seen", "Avg gap", "Min", "Max", "Std", "Gap", "Overdue",
            ]);
            let mut sorted: Vec<_> = numbers.iter().collect();
            sorted.sort_by(|a, b| {
                b.overdue_ratio
                    .partial_cmp(&a.overdue_ratio)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for stat in sorted {
                table.add_row(vec![
                    format!("{:2}", stat.number),
                    stat.appearances.to_string(),
                    format!("{:.1}", stat.average_gap),
                    stat.min_gap.to_string(),
                    stat.max_gap.to_string(),
                    format!("{:.1}", stat.std_dev),
                    stat.current_gap.to_string(),
                    format!("{:.2}", stat.overdue_ratio),
                ]);
            }
            println!("{table}");
        }
        PatternPayload::Positions { counts } => {
            let mut table = new_table(vec!["Position", "Top numbers (count)"]);
            for (position, row) in counts.iter().enumerate() {
                let mut ranked: Vec<(usize, u32)> = row
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| (i + 1, c))
                    .filter(|&(_, c)| c > 0)
                    .collect();
                ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
                let top = ranked
                    .iter()
                    .take(5)
                    .map(|(n, c)| format!("{} ({})", n, c))
                    .collect::<Vec<_>>()
                    .join(", ");
                table.add_row(vec![(position + 1).to_string(), top]);
            }
            println!("{table}");
        }
    }
}

pub fn display_markov(model: &MarkovModel, forecast: &MarkovForecast, query: &[u8]) {
    println!(
        "\nMarkov forecast (order {}, decay {}, window {} days, {} transitions, {} states)",
        model.order(),
        model.decay_factor(),
        model.window_days(),
        model.transition_count(),
        model.state_count()
    );
    println!("Query state: {:?}", query);
    match forecast.basis {
        ForecastBasis::Observed { order } => println!("Basis: observed order-{} state", order),
        ForecastBasis::LowerOrder { order } => {
            println!("Basis: fallback to order-{} state", order)
        }
        ForecastBasis::NoInformation => {
            println!("Basis: no observed state, uniform distribution")
        }
    }

    let mut table = new_table(vec!["Number", "Probability"]);
    for &(number, probability) in forecast.ranked.iter().take(10) {
        table.add_row(vec![
            format!("{:2}", number),
            format!("{:.4}", probability),
        ]);
    }
    println!("{table}");
}

fn factor_summary(factor: &Factor) -> String {
    match factor {
        Factor::FrequencyRank { rank, frequency } => {
            format!("frequency rank #{} ({} hits)", rank, frequency)
        }
        Factor::HotScore { score } => format!("hot score {:.3}", score),
        Factor::Overdue {
            current_gap,
            average_gap,
            ratio,
        } => format!(
            "overdue {:.2}x (gap {} vs avg {:.1})",
            ratio, current_gap, average_gap
        ),
        Factor::Transition { probability } => format!("transition prob {:.4}", probability),
        Factor::PositionFrequency { position, count } => {
            format!("position {} leader ({} hits)", position + 1, count)
        }
        Factor::PatternTarget { odd_count, sum_band } => {
            format!("fits {} odd / {} band", odd_count, sum_band)
        }
        Factor::BackZoneByFrequency => "back zone scored by frequency".to_string(),
        Factor::MarkovFallback { order } => format!("fell back to order {}", order),
        Factor::MarkovNoInformation => "no observed transitions, uniform".to_string(),
        Factor::HistoryTruncated { scanned, total } => {
            format!("history truncated to {} of {} draws", scanned, total)
        }
    }
}

pub fn display_prediction(prediction: &Prediction) {
    println!(
        "\nPrediction [{}] over {} draws (window {} days)",
        prediction.algorithm, prediction.sample_size, prediction.window_days
    );
    println!(
        "  Front: {}   Back: {}",
        join_numbers(&prediction.front),
        join_numbers(&prediction.back)
    );
    println!(
        "  Confidence: {:.2}{}",
        prediction.confidence,
        if prediction.low_confidence {
            " (LOW: small sample)"
        } else {
            ""
        }
    );
    for note in &prediction.notes {
        println!("  Note: {}", factor_summary(note));
    }

    let mut table = new_table(vec!["Zone", "Number", "Why"]);
    for reason in &prediction.reasoning {
        let why = reason
            .factors
            .iter()
            .map(factor_summary)
            .collect::<Vec<_>>()
            .join("; ");
        table.add_row(vec![
            reason.zone.to_string(),
            format!("{:2}", reason.number),
            why,
        ]);
    }
    println!("{table}");
}

pub fn display_consensus(consensus: &Consensus) {
    println!(
        "\nEnsemble consensus ({} members, agreement {:.2}, {})",
        consensus.members.len(),
        consensus.agreement,
        consensus.strength
    );
    println!(
        "  Front: {}   Back: {}",
        join_numbers(&consensus.front),
        join_numbers(&consensus.back)
    );
    println!(
        "  Confidence: {:.2}{}",
        consensus.confidence,
        if consensus.low_confidence {
            " (LOW: small sample)"
        } else {
            ""
        }
    );
    for dropped in &consensus.dropped {
        println!("  Dropped {}: {}", dropped.algorithm, dropped.reason);
    }

    let mut table = new_table(vec!["Member", "Weight", "Confidence", "Front", "Back"]);
    for member in &consensus.members {
        table.add_row(vec![
            member.algorithm.to_string(),
            format!("{:.2}", member.weight),
            format!("{:.2}", member.confidence),
            join_numbers(&member.front),
            join_numbers(&member.back),
        ]);
    }
    println!("{table}");

    let mut table = new_table(vec!["Zone", "Number", "Vote", "Supporters"]);
    for vote in consensus.front_votes.iter().take(10) {
        table.add_row(vec![
            Zone::Front.to_string(),
            format!("{:2}", vote.number),
            format!("{:.3}", vote.vote),
            vote.supporters.len().to_string(),
        ]);
    }
    for vote in consensus.back_votes.iter().take(5) {
        table.add_row(vec![
            Zone::Back.to_string(),
            format!("{:2}", vote.number),
            format!("{:.3}", vote.vote),
            vote.supporters.len().to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_grids(grids: &[Grid]) {
    println!("\nSuggested grids\n");
    let mut table = new_table(vec!["#", "Front", "Back", "Lift"]);
    for (i, grid) in grids.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            join_numbers(&grid.front),
            join_numbers(&grid.back),
            format!("{:.4}", grid.score),
        ]);
    }
    println!("{table}");
}

pub fn display_outcome(prediction: &Prediction, actual: &Draw, outcome: &PredictionOutcome) {
    println!(
        "\nValidation of [{}] against draw {} ({})",
        prediction.algorithm, actual.draw_number, actual.date
    );
    println!(
        "  Predicted: {} | {}",
        join_numbers(&prediction.front),
        join_numbers(&prediction.back)
    );
    let mut back = actual.back;
    back.sort_unstable();
    println!(
        "  Actual:    {} | {}",
        join_numbers(&actual.sorted_front()),
        join_numbers(&back)
    );
    println!(
        "  Matches: {} front, {} back ({:.1}% of drawn numbers)",
        outcome.front_matches, outcome.back_matches, outcome.accuracy
    );
}
