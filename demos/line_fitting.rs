//! Example: Robust line fitting with every estimator
//!
//! Fits the same contaminated point set with RANSAC, Least-Median-of-Squares
//! (sequential and concurrent) and the statistical pruning matcher.

use nalgebra::Point2;
use rand::seq::SliceRandom;
use rand::Rng;
use robustfit::estimators::{LineCodec, LineDistance, LineGenerator, LineManager};
use robustfit::models::Line2D;
use robustfit::*;

fn report(name: &str, matcher: &dyn ModelMatcher<Line2D, Point2<f64>>, n_total: usize) {
    let line = matcher.model();
    println!("{name}:");
    println!(
        "  Kept {} of {} points, fit quality {:.4}",
        matcher.match_set().len(),
        n_total,
        matcher.fit_quality()
    );
    println!(
        "  Line: {:.4}x + {:.4}y + {:.4} = 0",
        line.params[0], line.params[1], line.params[2]
    );
    if let Some((slope, intercept)) = line.to_slope_intercept() {
        println!("  In slope-intercept form: y = {slope:.4}x + {intercept:.4}");
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Robust Line Fitting Example ===\n");

    let n_inliers = 60;
    let n_outliers = 25;
    let n_total = n_inliers + n_outliers;

    let true_slope = 2.0;
    let true_intercept = 1.0;
    println!("True line: y = {true_slope:.2}x + {true_intercept:.2}");
    println!("Generating {n_inliers} inliers and {n_outliers} outliers\n");

    let mut rng = rand::thread_rng();
    let mut points = Vec::with_capacity(n_total);
    for i in 0..n_inliers {
        let x = (i as f64) * 0.2 - 6.0;
        let y = true_slope * x + true_intercept + rng.gen_range(-0.3..0.3);
        points.push(Point2::new(x, y));
    }
    for _ in 0..n_outliers {
        let x = rng.gen_range(-10.0..10.0);
        let y = rng.gen_range(-20.0..20.0);
        points.push(Point2::new(x, y));
    }
    points.shuffle(&mut rng);

    let ransac_settings = RansacSettings {
        inlier_threshold: 0.5,
        ..Default::default()
    };
    let mut ransac = Ransac::new(
        ransac_settings,
        LineManager,
        LineGenerator,
        LineDistance::default(),
    )?;
    if ransac.process(&points) {
        report("RANSAC", &ransac, n_total);
    } else {
        println!("RANSAC failed\n");
    }

    let lmeds_settings = LmedsSettings {
        inlier_fraction: 0.6,
        ..Default::default()
    };
    let mut lmeds = LeastMedianOfSquares::new(
        lmeds_settings.clone(),
        LineManager,
        LineGenerator,
        LineDistance::default(),
    )?;
    if lmeds.process(&points) {
        report("LMedS", &lmeds, n_total);
    }

    let mut lmeds_mt = LeastMedianOfSquaresConcurrent::new(
        lmeds_settings,
        ConcurrencySettings::default(),
        LineManager,
        LineGenerator,
        LineDistance::default(),
    )?;
    if lmeds_mt.process(&points) {
        report(
            &format!("LMedS on {} workers", lmeds_mt.workers()),
            &lmeds_mt,
            n_total,
        );
        println!(
            "  Same model as sequential: {}\n",
            lmeds_mt.model() == lmeds.model()
        );
    }

    // Pruning only copes with outliers that do not dominate the first fit, so
    // seed it with the LMedS match set.
    let mut pruning = StatisticalDistanceMatcher::new(
        StatisticalSettings::default(),
        LineManager,
        LineGenerator,
        LineDistance::default(),
        LineCodec,
    )?;
    if pruning.process(lmeds.match_set()) {
        report("Statistical pruning (on LMedS matches)", &pruning, n_total);
        println!(
            "  Converged: {} after {} iterations",
            pruning.converged(),
            pruning.iterations()
        );
    }

    Ok(())
}
