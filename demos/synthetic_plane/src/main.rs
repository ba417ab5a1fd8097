use argh::FromArgs;
use std::io::Write;
use std::path::PathBuf;

use contour_lift::image::{ImageSize, PixelBuffer};
use contour_lift::k3d::camera::PinholeRayCamera;
use contour_lift::k3d::mesh::TriangleMesh;
use contour_lift::{reconstruct, ExecutionStrategy, FrameInputs, ReconstructionConfig};

#[derive(FromArgs)]
/// Reconstruct the contour of a synthetic disc silhouette on a tilted plane
struct Args {
    /// width and height of the frame in pixels
    #[argh(option, default = "256")]
    size: usize,

    /// radius of the disc in pixels
    #[argh(option, default = "64.0")]
    radius: f32,

    /// depth of the plane at the optical axis
    #[argh(option, default = "20.0")]
    depth: f64,

    /// depth change of the plane per unit of x
    #[argh(option, default = "0.2")]
    tilt: f64,

    /// path to a JSON reconstruction config
    #[argh(option)]
    config: Option<PathBuf>,

    /// cast the rays on the rayon thread pool
    #[argh(switch)]
    parallel: bool,

    /// path to write the points as `x y z r g b a` lines
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,
}

/// The encoded buffers of a disc silhouette, row 0 at the bottom.
struct Frame {
    size: ImageSize,
    color: Vec<f32>,
    sdf: Vec<f32>,
    displacement: Vec<f32>,
}

fn disc_frame(size: usize, radius: f32, config: &ReconstructionConfig) -> Frame {
    let encoding = config.encoding;
    let encode = |v: f32| (v + encoding.offset) / encoding.scale;
    let center = size as f32 / 2.0;

    let mut color = Vec::with_capacity(size * size * 4);
    let mut sdf = Vec::with_capacity(size * size);
    let mut displacement = Vec::with_capacity(size * size * 3);
    for row in 0..size {
        for col in 0..size {
            let v = [col as f32 - center, row as f32 - center];
            let dist = v[0].hypot(v[1]);
            let d = dist - radius;
            // toward the nearest contour point, rows counted downwards
            let [right, down] = if dist > 0.0 {
                [-d * v[0] / dist, d * v[1] / dist]
            } else {
                [0.0, 0.0]
            };

            let shade = (row as f32 / size as f32).clamp(0.0, 1.0);
            color.extend([shade, 0.5, 1.0 - shade, 1.0]);
            sdf.push(encode(d));
            displacement.extend([0.0, encode(down), encode(right)]);
        }
    }

    Frame {
        size: ImageSize {
            width: size,
            height: size,
        },
        color,
        sdf,
        displacement,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut config = match &args.config {
        Some(path) => ReconstructionConfig::from_json_file(path)?,
        None => ReconstructionConfig::default(),
    };
    if args.parallel {
        config.execution = ExecutionStrategy::Parallel;
    }

    let frame = disc_frame(args.size, args.radius, &config);
    let inputs = FrameInputs::new(
        PixelBuffer::new(frame.size, 4, &frame.color)?,
        PixelBuffer::new(frame.size, 1, &frame.sdf)?,
        PixelBuffer::new(frame.size, 3, &frame.displacement)?,
    );

    let half = args.size as f64 / 2.0;
    let camera = PinholeRayCamera::new([half, half], 2.0 * half)?;

    // z = depth + tilt * x, wide enough for every ray of the frame
    let extent = 10.0 * args.depth;
    let plane = TriangleMesh::quad([
        [-extent, -extent, args.depth - args.tilt * extent],
        [extent, -extent, args.depth + args.tilt * extent],
        [extent, extent, args.depth + args.tilt * extent],
        [-extent, extent, args.depth - args.tilt * extent],
    ]);

    let res = reconstruct(&inputs, &plane, &camera, &config)?;

    println!("Reconstructed #{} points", res.cloud.len());
    println!("Stats: {:?}", res.stats);
    if let (Some(min), Some(max)) = (res.cloud.get_min_bound(), res.cloud.get_max_bound()) {
        println!("Bounds: {:?} - {:?}", min, max);
    }

    if let Some(path) = args.output {
        let mut writer = std::io::BufWriter::new(std::fs::File::create(&path)?);
        let (points, colors) = res.cloud.into_parts();
        let colors = colors.unwrap_or_else(|| vec![[1.0; 4]; points.len()]);
        for (p, c) in points.iter().zip(&colors) {
            writeln!(
                writer,
                "{} {} {} {} {} {} {}",
                p[0], p[1], p[2], c[0], c[1], c[2], c[3]
            )?;
        }
        log::info!("wrote {} points to {}", points.len(), path.display());
    }

    Ok(())
}
