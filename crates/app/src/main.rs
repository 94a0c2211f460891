//! Command-line host: load an OBJ file and report the resulting mesh.
//!
//! Usage: `app <file.obj> [--dedup[=on|off]] [--index-flush=line|end] [--dump]`

use anyhow::{Result, bail};
use asset::{IndexFlush, Mesh, ObjOptions, VertexReuse};

fn parse_dedup_arg(args: &[String]) -> VertexReuse {
    // --dedup[=on|off], по умолчанию off
    for arg in args {
        if arg == "--dedup" {
            return VertexReuse::Triple;
        }
        if let Some(val) = arg.strip_prefix("--dedup=") {
            return match val.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => VertexReuse::Triple,
                "0" | "false" | "off" | "no" => VertexReuse::Off,
                other => {
                    log::warn!("Unknown --dedup value '{}', vertex reuse stays off.", other);
                    VertexReuse::Off
                }
            };
        }
    }
    VertexReuse::Off
}

fn parse_index_flush_arg(args: &[String]) -> IndexFlush {
    let mut flush = IndexFlush::PerLine;
    for arg in args {
        if let Some(val) = arg.strip_prefix("--index-flush=") {
            flush = match val.to_ascii_lowercase().as_str() {
                "line" | "per-line" => IndexFlush::PerLine,
                "end" | "eof" => IndexFlush::EndOfParse,
                other => {
                    log::warn!("Unknown --index-flush '{}', falling back to per-line.", other);
                    IndexFlush::PerLine
                }
            };
        }
    }
    flush
}

fn parse_dump_arg(args: &[String]) -> bool {
    args.iter().any(|arg| arg == "--dump")
}

fn parse_path_arg(args: &[String]) -> Option<&str> {
    args.iter()
        .map(String::as_str)
        .find(|arg| !arg.starts_with("--"))
}

fn options_from_args(args: &[String]) -> ObjOptions {
    ObjOptions::default()
        .with_vertex_reuse(parse_dedup_arg(args))
        .with_index_flush(parse_index_flush_arg(args))
}

fn dump_triangles(mesh: &Mesh) {
    for (i, [a, b, c]) in mesh.triangles().enumerate() {
        println!(
            "{:>6}: ({}, {}, {}) ({}, {}, {}) ({}, {}, {})",
            i, a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(path) = parse_path_arg(&args) else {
        bail!("usage: app <file.obj> [--dedup[=on|off]] [--index-flush=line|end] [--dump]");
    };
    let options = options_from_args(&args);
    log::info!(
        "Loading {} (vertex_reuse={:?}, index_flush={:?})",
        path,
        options.vertex_reuse,
        options.index_flush
    );

    let mesh = asset::load_obj_from_path(path, &options)?;
    log::info!(
        "Mesh: {} vertices, {} indices, {} triangles",
        mesh.vertex_count(),
        mesh.indices.len(),
        mesh.triangle_count()
    );
    if mesh.is_empty() {
        log::warn!("{} contains no faces", path);
    } else if let Some((min, max)) = mesh.bounds() {
        log::info!("Bounds: min={:?} max={:?}", min, max);
    }

    if parse_dump_arg(&args) {
        dump_triangles(&mesh);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let a = args(&["model.obj"]);
        assert_eq!(options_from_args(&a), ObjOptions::default());
        assert_eq!(parse_path_arg(&a), Some("model.obj"));
        assert!(!parse_dump_arg(&a));
    }

    #[test]
    fn flags_select_options() {
        let a = args(&["--dedup", "--index-flush=end", "--dump", "model.obj"]);
        let options = options_from_args(&a);
        assert_eq!(options.vertex_reuse, VertexReuse::Triple);
        assert_eq!(options.index_flush, IndexFlush::EndOfParse);
        assert!(parse_dump_arg(&a));
        assert_eq!(parse_path_arg(&a), Some("model.obj"));
    }

    #[test]
    fn unknown_values_fall_back() {
        let a = args(&["--dedup=maybe", "--index-flush=sometimes"]);
        assert_eq!(options_from_args(&a), ObjOptions::default());
        assert_eq!(parse_path_arg(&a), None);
    }

    #[test]
    fn dedup_can_be_turned_off_explicitly() {
        assert_eq!(parse_dedup_arg(&args(&["--dedup=off"])), VertexReuse::Off);
        assert_eq!(parse_dedup_arg(&args(&["--dedup=ON"])), VertexReuse::Triple);
    }
}
