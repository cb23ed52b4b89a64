use std::sync::Arc;

use crossbeam_channel::{Receiver, bounded};
use gpui::{
    AnyElement, App, AppContext, Context, InteractiveElement, IntoElement, MouseButton,
    MouseDownEvent, ObjectFit, ParentElement, Render, RenderImage, SharedString, Styled,
    StyledImage, TitlebarOptions, Window, WindowOptions, div, img, px,
};
use gpui_component::{
    ActiveTheme, Root,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};
use image::{Frame as ImageFrame, ImageBuffer, Rgba};

use crate::{
    config::{AppConfig, DisplayConfig},
    gesture::GestureState,
    pipeline::LandmarkProvider,
    session::{SessionControls, SessionEvent},
    stroke::{MAX_BRUSH_WIDTH, MIN_BRUSH_WIDTH},
    types::{DisplayFrame, Rgb},
};

mod main_view;
mod render_util;

pub fn launch_ui(
    app: &mut App,
    config: AppConfig,
    provider: Box<dyn LandmarkProvider>,
) -> gpui::Result<()> {
    let window_options = WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some("Air Canvas".into()),
            appears_transparent: false,
            traffic_light_position: None,
        }),
        ..Default::default()
    };

    app.open_window(window_options, move |window, app| {
        let view = app.new(|_| AppView::new(config, provider));
        app.new(|cx| Root::new(view, window, cx))
    })?;

    Ok(())
}

struct AppView {
    controls: SessionControls,
    display: DisplayConfig,
    frame_rx: Receiver<DisplayFrame>,
    event_rx: Receiver<SessionEvent>,
    latest_image: Option<Arc<RenderImage>>,
    gesture: GestureState,
    error: Option<String>,
}

impl AppView {
    fn new(config: AppConfig, provider: Box<dyn LandmarkProvider>) -> Self {
        let (frame_tx, frame_rx) = bounded(1);
        let display = config.display;
        let (mut controls, event_rx) = SessionControls::new(config, frame_tx);
        controls.set_provider(provider);

        Self {
            controls,
            display,
            frame_rx,
            event_rx,
            latest_image: None,
            gesture: GestureState::Idle,
            error: None,
        }
    }

    fn poll_events(&mut self) {
        for event in self.event_rx.try_iter() {
            match event {
                SessionEvent::Started => self.error = None,
                SessionEvent::Gesture(state) => self.gesture = state,
                SessionEvent::Failed(message) => self.error = Some(message),
                SessionEvent::Stopped => self.gesture = GestureState::Idle,
            }
        }
    }

    fn poll_frames(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        let Some(frame) = self.frame_rx.try_iter().last() else {
            return;
        };
        if let Some(image) = render_util::display_to_image(frame) {
            self.replace_latest_image(Some(image), window, cx);
        }
    }

    fn replace_latest_image(
        &mut self,
        new_image: Option<Arc<RenderImage>>,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) {
        let old_image = match new_image {
            Some(image) => self.latest_image.replace(image),
            None => self.latest_image.take(),
        };
        if let Some(old_image) = old_image {
            // Each frame is its own texture; release it or the atlas grows
            // without bound while the camera runs.
            cx.drop_image(old_image, Some(window));
        }
    }

    fn start(&mut self, cx: &mut Context<'_, Self>) {
        if let Err(err) = self.controls.start_session() {
            log::error!("failed to start session: {err:?}");
            self.error = Some(format!("{err:#}"));
        }
        cx.notify();
    }

    fn stop(&mut self, window: &mut Window, cx: &mut Context<'_, Self>) {
        self.controls.stop_session();
        self.replace_latest_image(None, window, cx);
        cx.notify();
    }

    fn clear(&mut self, cx: &mut Context<'_, Self>) {
        self.controls.clear();
        cx.notify();
    }

    fn select_color(&mut self, color: Rgb, cx: &mut Context<'_, Self>) {
        if let Err(err) = self.controls.set_color(color) {
            self.error = Some(err.to_string());
        }
        cx.notify();
    }

    fn step_brush_width(&mut self, delta: i32, cx: &mut Context<'_, Self>) {
        let width = self.controls.brush().width().saturating_add_signed(delta);
        if (MIN_BRUSH_WIDTH..=MAX_BRUSH_WIDTH).contains(&width) {
            if let Err(err) = self.controls.set_brush_width(width) {
                self.error = Some(err.to_string());
            }
        }
        cx.notify();
    }
}

impl Render for AppView {
    fn render(
        &mut self,
        window: &mut Window,
        cx: &mut Context<'_, Self>,
    ) -> impl gpui::IntoElement {
        cx.defer_in(window, |_, _, cx| {
            cx.notify();
        });

        self.poll_events();
        self.poll_frames(window, cx);
        self.render_main(cx)
    }
}
