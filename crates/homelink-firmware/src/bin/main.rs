#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use embassy_executor::Spawner;
use embassy_net::{Runner, StackResources};
use embassy_time::{Duration, Instant, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_radio::wifi::{ClientConfiguration, Configuration, WifiDevice};
use log::{info, warn};
use static_cell::StaticCell;

use homelink_core::bridge::{Bridge, DroppingSink};
use homelink_core::buttons::ButtonBank;
use homelink_core::config::WIFI_POLL_INTERVAL;
use homelink_core::link::ReconnectTimer;
use homelink_core::relay::RelayBank;
use homelink_firmware::sinric::SinricClient;
use homelink_firmware::wifi_secrets;

/// Pause between main-loop ticks; keeps the executor cooperative.
const TICK_PAUSE: Duration = Duration::from_millis(10);

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_print!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Relay outputs first: every coil released before anything else can
    // run. RelayBank::new re-asserts HIGH on all four.
    let relays = RelayBank::new([
        Output::new(peripherals.GPIO5, Level::High, OutputConfig::default()),
        Output::new(peripherals.GPIO4, Level::High, OutputConfig::default()),
        Output::new(peripherals.GPIO0, Level::High, OutputConfig::default()),
        Output::new(peripherals.GPIO2, Level::High, OutputConfig::default()),
    ]);

    let pull_up = InputConfig::default().with_pull(Pull::Up);
    let buttons = ButtonBank::new(
        [
            Input::new(peripherals.GPIO14, pull_up),
            Input::new(peripherals.GPIO12, pull_up),
            Input::new(peripherals.GPIO13, pull_up),
            Input::new(peripherals.GPIO3, pull_up),
        ],
        Instant::now(),
    );

    let mut rng = Rng::new(peripherals.RNG);

    let radio_init = esp_radio::init().expect("failed to initialize radio controller");
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(&radio_init, peripherals.WIFI, Default::default())
            .expect("failed to initialize Wi-Fi controller");

    let wifi_config = Configuration::Client(ClientConfiguration {
        ssid: wifi_secrets::WIFI_SSID.try_into().unwrap(),
        password: wifi_secrets::WIFI_PASSWORD.try_into().unwrap(),
        ..Default::default()
    });
    wifi_controller
        .set_configuration(&wifi_config)
        .expect("invalid Wi-Fi configuration");
    wifi_controller
        .start_async()
        .await
        .expect("failed to start Wi-Fi");

    info!("connecting to Wi-Fi \"{}\"...", wifi_secrets::WIFI_SSID);
    // Association blocks forever on failure. There is no timeout and no
    // fallback; power-cycling the device is the only way out.
    while let Err(e) = wifi_controller.connect_async().await {
        warn!("Wi-Fi association failed: {e:?}, retrying");
        Timer::after(WIFI_POLL_INTERVAL).await;
    }
    info!("Wi-Fi connected");

    let net_seed = ((rng.random() as u64) << 32) | rng.random() as u64;
    let net_config = embassy_net::Config::dhcpv4(Default::default());
    static RESOURCES: StaticCell<StackResources<4>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        net_config,
        RESOURCES.init(StackResources::new()),
        net_seed,
    );
    spawner.spawn(net_task(runner)).expect("failed to spawn net task");

    stack.wait_config_up().await;
    if let Some(cfg) = stack.config_v4() {
        info!("IP address: {}", cfg.address);
    }

    let mut rx_buf = [0u8; 2048];
    let mut tx_buf = [0u8; 2048];
    let mut bridge = Bridge::new(relays, buttons, Instant::now());
    let mut reconnect = ReconnectTimer::new();

    loop {
        // Link down: keep ticking buttons and wait out the reconnect
        // interval. Outbound frames go nowhere.
        if !reconnect.due(Instant::now()) {
            bridge.tick(Instant::now(), &mut DroppingSink);
            Timer::after(TICK_PAUSE).await;
            continue;
        }

        let mut client =
            match SinricClient::connect(stack, &mut rx_buf, &mut tx_buf, rng.random()).await {
                Ok(client) => client,
                Err(e) => {
                    warn!("cloud connection failed: {e}");
                    continue;
                }
            };
        bridge.on_link_up();

        loop {
            match client.recv().await {
                Ok(Some(frame)) => bridge.on_frame(&frame),
                Ok(None) => {}
                Err(e) => {
                    warn!("link lost: {e}");
                    break;
                }
            }
            bridge.tick(Instant::now(), &mut client);
            if let Err(e) = client.flush().await {
                warn!("link lost: {e}");
                break;
            }
            Timer::after(TICK_PAUSE).await;
        }

        bridge.on_link_down();
        client.close().await;
    }
}
