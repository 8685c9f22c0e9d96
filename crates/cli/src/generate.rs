//! `vantage generate`: seeded placement passes and per-frame annotations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use vantage_core::{BoundingBoxSet, PoseSet, SceneSession, SpawnRequest, SpawnResult, World};

use crate::{parse_request, SceneArgs};

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Frames to generate; frame N uses seed + N
    #[arg(long, default_value = "1")]
    pub frames: u32,

    /// Vehicle to spawn, as ASSET[=CLASS] (repeatable)
    #[arg(long = "vehicle", value_parser = parse_request)]
    pub vehicles: Vec<SpawnRequest>,

    /// Prop to scatter, as ASSET[=CLASS] (repeatable)
    #[arg(long = "prop", value_parser = parse_request)]
    pub props: Vec<SpawnRequest>,

    /// Cap on parked vehicles (default: one per --vehicle)
    #[arg(long)]
    pub parking: Option<usize>,

    /// Vehicles per configured lane
    #[arg(long, default_value = "0")]
    pub lane_vehicles: usize,

    /// Props to scatter over the sidewalk
    #[arg(long, default_value = "0")]
    pub prop_count: usize,

    /// Hide pre-placed marker-tagged entities before the first frame
    #[arg(long)]
    pub sweep: bool,

    /// Hide spawned entities below the visibility threshold
    #[arg(long)]
    pub hide_low_visibility: bool,

    /// Leave entities below the visibility threshold out of annotations
    #[arg(long)]
    pub filter_visibility: bool,

    /// Directory for per-frame annotation files (default: JSON lines on stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Everything produced for one frame.
#[derive(Debug, Serialize)]
pub struct FrameRecord {
    pub frame: u32,
    pub seed: u32,
    pub spawned: usize,
    pub failed: usize,
    pub bounding_boxes: BoundingBoxSet,
    pub poses: PoseSet,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let (mut world, mut session) = args.scene.load()?;

    let summary = session.resolve_anchors(&world)?;
    if !summary.missing.is_empty() {
        tracing::warn!(missing = ?summary.missing, "Some anchors did not resolve");
    }

    if args.sweep {
        session.sweep_and_hide(&mut world, None)?;
    }

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for frame in 0..args.frames {
        let record = generate_frame(&mut session, &mut world, &args, frame)?;
        match &args.output {
            Some(dir) => write_frame(dir, &record)?,
            None => println!("{}", serde_json::to_string(&record)?),
        }
    }

    tracing::info!(frames = args.frames, "Generation complete");
    Ok(())
}

/// Reseeds, populates and annotates one frame.
pub fn generate_frame(
    session: &mut SceneSession,
    world: &mut dyn World,
    args: &GenerateArgs,
    frame: u32,
) -> anyhow::Result<FrameRecord> {
    let seed = args.scene.seed.wrapping_add(frame);
    session.reseed(world, seed)?;

    let mut results: Vec<SpawnResult> = Vec::new();
    if !args.vehicles.is_empty() {
        if !session.config().spawn.parking_anchors.is_empty() {
            results.extend(session.spawn_parking(world, &args.vehicles, args.parking)?);
        }
        if args.lane_vehicles > 0 {
            results.extend(session.spawn_lane_vehicles(world, &args.vehicles, args.lane_vehicles)?);
        }
    }
    if !args.props.is_empty() && args.prop_count > 0 {
        results.extend(session.spawn_in_area(world, &args.props, args.prop_count)?);
    }

    if args.hide_low_visibility {
        session.hide_low_visibility(world)?;
    }

    let spawn = &session.config().spawn;
    let tags = vec![spawn.marker_tag.clone(), spawn.prop_tag.clone()];
    let annotations = session.extract_bounding_boxes(world, &tags, args.filter_visibility)?;
    let poses = session.extract_poses(world, &tags, args.filter_visibility)?;

    let spawned = results.iter().filter(|r| r.success).count();
    let record = FrameRecord {
        frame,
        seed,
        spawned,
        failed: results.len() - spawned,
        bounding_boxes: BoundingBoxSet { annotations },
        poses: PoseSet { poses },
    };

    tracing::info!(
        frame,
        seed,
        spawned = record.spawned,
        failed = record.failed,
        boxes = record.bounding_boxes.annotations.len(),
        "Frame generated"
    );
    Ok(record)
}

fn write_frame(dir: &Path, record: &FrameRecord) -> anyhow::Result<()> {
    let boxes = dir.join(format!("frame_{:04}_bboxes.json", record.frame));
    fs::write(&boxes, record.bounding_boxes.to_json()?).with_context(|| format!("writing {}", boxes.display()))?;

    let poses = dir.join(format!("frame_{:04}_poses.json", record.frame));
    fs::write(&poses, record.poses.to_json()?).with_context(|| format!("writing {}", poses.display()))?;
    Ok(())
}
