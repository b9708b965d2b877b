use std::rc::Rc;

use stagepen::{
    CollisionQuery, CollisionStrategy, Costume, CostumeId, CpuCollisionStrategy,
    GpuCollisionOpts, GpuCollisionStrategy, PenRenderer, PenRendererOpts, PenState, Rgb8,
    SolidBackdrop, SpriteId, SpriteView, broad_phase,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut renderer = PenRenderer::new(PenRendererOpts::default().with_env_overrides())?;
    let mut cpu = CpuCollisionStrategy::default();
    let mut gpu = GpuCollisionStrategy::new(&mut renderer, GpuCollisionOpts::default())?;
    let scene = SolidBackdrop {
        rgb: Rgb8::from_hex("#ffffff")?,
    };

    let mut pen = PenState::new();
    pen.set_color_from_rgb(Rgb8::from_hex("#ff0000")?);
    pen.set_size(6.0);
    pen.set_down(true, -120.0, -60.0);
    for step in 1..=24 {
        let x = -120.0 + f64::from(step) * 10.0;
        let y = -60.0 + (f64::from(step) * 0.5).sin() * 40.0;
        pen.update_position(x, y, &mut renderer);
    }
    renderer.flush();

    let costume = Rc::new(Costume::solid(CostumeId(1), 24, 24, [0, 160, 0, 255]));
    let sprites: Vec<SpriteView> = (0..5)
        .map(|i| {
            let x = -100.0 + f64::from(i) * 50.0;
            let t = costume.placement(x, -60.0, 1.0, 90.0 + f64::from(i) * 15.0);
            SpriteView::new(SpriteId(i as u64), Rc::clone(&costume), t, i)
        })
        .collect();

    let red = Rgb8::new(255, 0, 0);
    for sprite in &sprites {
        let Some((bounds, candidates)) = broad_phase(sprite, &sprites) else {
            continue;
        };
        let query = CollisionQuery::new(sprite, red)
            .with_bounds(bounds)
            .with_candidates(&candidates)
            .with_scene(&scene);
        let c = cpu.check(&query, &mut renderer);
        let g = gpu.check(&query, &mut renderer);
        println!("sprite {}: cpu {c:?} gpu {g:?}", sprite.id.0);
    }

    println!("{:?}", renderer.stats());
    Ok(())
}
