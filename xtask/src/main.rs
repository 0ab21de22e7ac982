use camino::{Utf8Path, Utf8PathBuf};
use cartouche::{
    Alignment, Annotation, AnnotationRenderer, BoundingBox, CanvasOffset, CanvasPoint, CanvasSize, Color,
    CurveControl, Direction, GeoScale, Length, PixmapSurface, ScaleBarBuilder, ScaleBarOptions, ScaleBarRequest,
    ShapedTextLayout, SvgIcon, TextEngine, Theme, TickParity,
};
use miette::IntoDiagnostic;
use rayon::prelude::*;
use std::fs;

const WIDTH_PX: f64 = 480.0;
const HEIGHT_PX: f64 = 320.0;

const FLAG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="12" height="8">
    <rect width="12" height="8" fill="#ffffff"/>
    <rect width="4" height="8" fill="#002395"/>
    <rect x="8" width="4" height="8" fill="#ed2939"/>
</svg>"##;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo xtask <command>");
        eprintln!("Commands:");
        eprintln!("  gallery [--shaped] [OUT_DIR]    Render sample compositions to PNG");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "gallery" => {
            let shaped = args[2..].iter().any(|a| a == "--shaped");
            let out = args[2..]
                .iter()
                .find(|a| !a.starts_with("--"))
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../target/gallery"));
            if let Err(e) = gallery(&out, shaped) {
                eprintln!("{e:?}");
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            std::process::exit(1);
        }
    }
}

/// A named composition drawn onto a fresh canvas
struct Scene {
    name: &'static str,
    background: Color,
    theme: Theme,
    draw: fn(&mut PixmapSurface, &AnnotationRenderer, &ScaleBarBuilder) -> cartouche::Result<()>,
}

fn scenes() -> Vec<Scene> {
    let slate = Color::rgb8(0x2b, 0x33, 0x3d);
    let paper = Color::rgb8(0xf4, 0xf1, 0xea);
    vec![
        Scene { name: "directions", background: slate, theme: Theme::dark(), draw: directions },
        Scene { name: "markup", background: slate, theme: Theme::dark(), draw: markup },
        Scene { name: "curves", background: paper, theme: Theme::light(), draw: curves },
        Scene { name: "flags", background: slate, theme: Theme::dark(), draw: flags },
        Scene { name: "scale-bars", background: paper, theme: Theme::light(), draw: scale_bars },
    ]
}

fn gallery(out: &Utf8Path, shaped: bool) -> miette::Result<()> {
    fs::create_dir_all(out).into_diagnostic()?;
    let engine: TextEngine = if shaped {
        ShapedTextLayout::system().into()
    } else {
        TextEngine::default()
    };

    let rendered: Vec<cartouche::Result<Utf8PathBuf>> = scenes()
        .par_iter()
        .map(|scene| {
            let annotations = AnnotationRenderer::new(engine.clone()).with_theme(scene.theme.clone());
            let scale_bars = ScaleBarBuilder::new(engine.clone()).with_theme(scene.theme.clone());
            let mut surface = PixmapSurface::from_px(WIDTH_PX, HEIGHT_PX)?;
            surface.clear(scene.background);
            (scene.draw)(&mut surface, &annotations, &scale_bars)?;

            let path = out.join(format!("{}.png", scene.name));
            surface.save_png(&path)?;
            eprintln!("Rendered {}", path);
            Ok(path)
        })
        .collect();

    let mut images = Vec::new();
    for result in rendered {
        images.push(result?);
    }

    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head><meta charset=\"UTF-8\"><title>cartouche gallery</title></head>\n<body style=\"background:#eee\">\n");
    for image in &images {
        let file = image.file_name().unwrap_or_default();
        html.push_str(&format!("<figure><img src=\"{file}\"><figcaption>{file}</figcaption></figure>\n"));
    }
    html.push_str("</body>\n</html>\n");
    let index = out.join("index.html");
    fs::write(&index, html).into_diagnostic()?;
    eprintln!("Wrote {} scenes to {}", images.len(), index);
    Ok(())
}

fn canvas() -> BoundingBox {
    BoundingBox::from_origin_size(
        CanvasPoint::pt(0.0, 0.0),
        CanvasSize::new(Length::px(WIDTH_PX), Length::px(HEIGHT_PX)),
    )
}

fn directions(surface: &mut PixmapSurface, renderer: &AnnotationRenderer, _: &ScaleBarBuilder) -> cartouche::Result<()> {
    let center = CanvasPoint::px(WIDTH_PX / 2.0, HEIGHT_PX / 2.0);
    for direction in Direction::ALL {
        let annotation = Annotation::new(center, direction, Length::px(70.0), direction.to_string());
        renderer.render(surface, &annotation, None)?;
    }
    Ok(())
}

fn markup(surface: &mut PixmapSurface, renderer: &AnnotationRenderer, _: &ScaleBarBuilder) -> cartouche::Result<()> {
    let labels = [
        (CanvasPoint::px(120.0, 220.0), Direction::Up, Alignment::Left, "New Amsterdam\n<span size=\"80%\">Est. 1625</span>"),
        (CanvasPoint::px(360.0, 220.0), Direction::Up, Alignment::Right, "<b>Fort Orange</b>\n<i>trading post</i>"),
        (CanvasPoint::px(240.0, 80.0), Direction::Down, Alignment::Center, "Hudson &amp; Mohawk"),
    ];
    for (anchor, direction, alignment, text) in labels {
        let annotation = Annotation::new(anchor, direction, Length::px(60.0), text).with_alignment(alignment);
        renderer.render(surface, &annotation, None)?;
    }
    Ok(())
}

fn curves(surface: &mut PixmapSurface, renderer: &AnnotationRenderer, _: &ScaleBarBuilder) -> cartouche::Result<()> {
    let bends = [
        (CanvasPoint::px(80.0, 240.0), CanvasOffset::px(0.0, -80.0), CanvasOffset::px(-40.0, 0.0)),
        (CanvasPoint::px(240.0, 260.0), CanvasOffset::px(40.0, 0.0), CanvasOffset::px(0.0, 60.0)),
    ];
    for (anchor, start, end) in bends {
        let annotation = Annotation::new(anchor, Direction::Right, CanvasOffset::px(120.0, -150.0), "Harbour")
            .with_curve(CurveControl::new(Some(start), Some(end)));
        renderer.render(surface, &annotation, None)?;
    }
    Ok(())
}

fn flags(surface: &mut PixmapSurface, renderer: &AnnotationRenderer, _: &ScaleBarBuilder) -> cartouche::Result<()> {
    let mut flag = SvgIcon::parse(FLAG.as_bytes())
        .map_err(|source| cartouche::Error::IconParse { path: "flag.svg".into(), source })?;
    let cities = [
        (CanvasPoint::px(100.0, 100.0), "Paris"),
        (CanvasPoint::px(140.0, 200.0), "Lyon"),
        (CanvasPoint::px(220.0, 260.0), "Marseille"),
    ];
    for (anchor, name) in cities {
        let annotation = Annotation::new(anchor, Direction::Right, Length::px(40.0), name);
        renderer.render(surface, &annotation, Some(&mut flag))?;
    }
    Ok(())
}

fn scale_bars(surface: &mut PixmapSurface, _: &AnnotationRenderer, builder: &ScaleBarBuilder) -> cartouche::Result<()> {
    // 1 px per 2 km
    let scale = GeoScale::new(Length::px(1.0).raw(), 2.0)?;
    let request = ScaleBarRequest::new(canvas(), scale, 300.0, 3)
        .with_label(0.0, "0")
        .with_label(300.0, "300 km");
    builder.render(surface, &request)?;

    // Same bar lower down with the other parity
    let lower = BoundingBox::from_origin_size(
        CanvasPoint::px(0.0, 120.0),
        CanvasSize::new(Length::px(WIDTH_PX), Length::px(HEIGHT_PX - 120.0)),
    );
    let even = builder
        .clone()
        .with_options(ScaleBarOptions::default().with_tick_parity(TickParity::Even));
    even.render(surface, &ScaleBarRequest::new(lower, scale, 300.0, 3).with_label(150.0, "150"))?;
    Ok(())
}
