//! Builds every GPU resource of the forest on a real adapter, renders one
//! frame offscreen through [`GpuScene`] and reads pixels back. Needs a GPU,
//! so it only runs with the `integration-tests` feature.
#![cfg(feature = "integration-tests")]

use std::time::Duration;

use virtual_forest::{
    ForestConfig,
    camera::CameraResources,
    data_structures::texture::MSAA_SAMPLES,
    pipelines::light::LightResources,
    render::{GpuScene, RenderTarget},
    scene::SceneAssembler,
};

const SIZE: u32 = 256;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

async fn device() -> Option<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions::default())
        .await
        .ok()?;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default())
        .await
        .ok()?;
    Some((adapter, device, queue))
}

/// Renders `config` into a `SIZE`×`SIZE` texture and returns its RGBA bytes.
async fn render_offscreen(
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    config: &ForestConfig,
) -> (GpuScene, Vec<u8>) {
    let scene = SceneAssembler::new(config).assemble().unwrap();
    let sample_count = if adapter
        .get_texture_format_features(FORMAT)
        .flags
        .sample_count_supported(MSAA_SAMPLES)
    {
        MSAA_SAMPLES
    } else {
        1
    };
    let camera = CameraResources::new(device, &config.camera, SIZE, SIZE);
    let light = LightResources::new(device, scene.lights().clone());
    let target = RenderTarget::new(device, FORMAT, [SIZE, SIZE], sample_count);
    let gpu_scene = GpuScene::new(device, &target, &camera, &light, &scene);
    gpu_scene.write_transforms(queue, &scene);

    let output = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen output"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    gpu_scene.encode(&mut encoder, &view, &target, &camera, &light, config.clear_colour);

    let u32_size = std::mem::size_of::<u32>() as u32;
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        size: (u32_size * SIZE * SIZE) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        label: None,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &output,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(u32_size * SIZE),
                rows_per_image: Some(SIZE),
            },
        },
        output.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })
        .unwrap();
    rx.receive().await.unwrap().unwrap();
    let pixels = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    (gpu_scene, pixels)
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = ((y * SIZE + x) * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

fn assert_near(got: [u8; 4], want: [u8; 4]) {
    for (g, w) in got.iter().zip(want) {
        assert!(g.abs_diff(w) <= 2, "got {got:?}, want {want:?}");
    }
}

#[tokio::test]
async fn sky_fills_the_top_of_the_frame() {
    let Some((adapter, device, queue)) = device().await else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let mut config = ForestConfig::seeded(11);
    // tilt the view upwards so nothing but sky is in the top rows
    config.camera.look_at = [0.0, 200.0, 0.0];
    let (gpu_scene, pixels) = render_offscreen(&adapter, &device, &queue, &config).await;

    assert_eq!(gpu_scene.mesh_count(), 1 + 16 * 4 + 15 + 1 + 100);
    // trunks, foliage and rocks
    assert_eq!(gpu_scene.shadow_caster_count(), 16 * 4 + 15);

    // #87ceeb after sRGB encoding
    let sky = [0x87, 0xce, 0xeb, 0xff];
    assert_near(pixel(&pixels, 0, 0), sky);
    assert_near(pixel(&pixels, SIZE - 1, 0), sky);
}

#[tokio::test]
async fn ground_covers_the_bottom_of_the_frame() {
    let Some((adapter, device, queue)) = device().await else {
        eprintln!("no adapter available, skipping");
        return;
    };
    let mut config = ForestConfig::seeded(11);
    // look down at the origin from the top of the orbit
    config.camera.initial_height = 30.0;
    config.camera.look_at = [0.0, 0.0, 0.0];
    let (_, pixels) = render_offscreen(&adapter, &device, &queue, &config).await;

    let bottom = pixel(&pixels, SIZE / 2, SIZE - 1);
    assert_ne!(bottom, [0x87, 0xce, 0xeb, 0xff], "ground missing");
}
