use super::{
    ActiveTheme, AnyElement, AppView, Button, ButtonVariants, Context, InteractiveElement,
    IntoElement, MouseButton, MouseDownEvent, ObjectFit, ParentElement, SharedString, Styled,
    StyledImage, div, h_flex, img, px, v_flex,
};
use crate::types::PALETTE;

const SWATCH_SIZE: f32 = 28.0;

impl AppView {
    pub(super) fn render_main(&self, cx: &mut Context<'_, Self>) -> AnyElement {
        let running = self.controls.is_running();
        let width = self.display.width as f32;
        let height = self.display.height as f32;

        let frame_view: AnyElement = match &self.latest_image {
            Some(image) if running => img(image.clone())
                .size_full()
                .object_fit(ObjectFit::Contain)
                .into_any_element(),
            _ => div()
                .size_full()
                .flex()
                .items_center()
                .justify_center()
                .text_sm()
                .text_color(gpui::rgb(0x8b95a5))
                .child(if running {
                    "Waiting for camera..."
                } else {
                    "Press Start to open the camera"
                })
                .into_any_element(),
        };

        let video = div()
            .w(px(width))
            .h(px(height))
            .overflow_hidden()
            .rounded_lg()
            .bg(gpui::rgb(0x000000))
            .child(frame_view);

        v_flex()
            .size_full()
            .gap_3()
            .p_4()
            .bg(gpui::rgb(0x1a2332))
            .child(self.render_status(running, cx))
            .child(video)
            .child(self.render_controls(running, cx))
            .into_any_element()
    }

    fn render_status(&self, running: bool, cx: &mut Context<'_, Self>) -> AnyElement {
        let theme = cx.theme();
        let (session_icon, session_text, session_color) = if running {
            ("●", "Running", theme.success)
        } else {
            ("○", "Stopped", theme.muted_foreground)
        };

        let pill = |color: gpui::Hsla, text: String| {
            div()
                .px_2()
                .py_0p5()
                .rounded_md()
                .bg(gpui::rgba(0x00000033))
                .text_xs()
                .text_color(color)
                .child(text)
        };

        let mut row = h_flex()
            .gap_3()
            .items_center()
            .child(pill(session_color, format!("{session_icon} {session_text}")))
            .child(pill(
                theme.foreground,
                format!("Gesture: {}", self.gesture.label()),
            ));

        if let Some(err) = &self.error {
            row = row.child(
                div()
                    .px_2()
                    .py_0p5()
                    .rounded_md()
                    .bg(gpui::rgba(0xef444433))
                    .border_1()
                    .border_color(gpui::rgba(0xef4444ff))
                    .text_xs()
                    .text_color(gpui::rgb(0xfca5a5))
                    .child(err.clone()),
            );
        }

        row.into_any_element()
    }

    fn render_controls(&self, running: bool, cx: &mut Context<'_, Self>) -> AnyElement {
        let session_buttons = h_flex()
            .gap_2()
            .child(if running {
                Button::new(SharedString::from("stop"))
                    .outline()
                    .label("Stop")
                    .on_click(cx.listener(|this, _, window, cx| this.stop(window, cx)))
            } else {
                Button::new(SharedString::from("start"))
                    .primary()
                    .label("Start")
                    .on_click(cx.listener(|this, _, _, cx| this.start(cx)))
            })
            .child(
                Button::new(SharedString::from("clear"))
                    .outline()
                    .label("Clear")
                    .on_click(cx.listener(|this, _, _, cx| this.clear(cx))),
            );

        let selected = self.controls.brush().color();
        let mut swatches = h_flex().gap_2().items_center();
        for color in PALETTE {
            let border = if color == selected {
                gpui::rgba(0xffffffff)
            } else {
                gpui::rgba(0x00000000)
            };
            swatches = swatches.child(
                div()
                    .size(px(SWATCH_SIZE))
                    .rounded_full()
                    .border_2()
                    .border_color(border)
                    .bg(gpui::rgb(color.hex()))
                    .cursor_pointer()
                    .on_mouse_down(
                        MouseButton::Left,
                        cx.listener(move |this, _: &MouseDownEvent, _, cx| {
                            this.select_color(color, cx)
                        }),
                    ),
            );
        }

        let brush = h_flex()
            .gap_2()
            .items_center()
            .child(
                Button::new(SharedString::from("brush-thinner"))
                    .outline()
                    .label("-")
                    .on_click(cx.listener(|this, _, _, cx| this.step_brush_width(-1, cx))),
            )
            .child(
                div()
                    .text_sm()
                    .text_color(gpui::rgb(0xc9d1d9))
                    .child(format!("Brush {} px", self.controls.brush().width())),
            )
            .child(
                Button::new(SharedString::from("brush-thicker"))
                    .outline()
                    .label("+")
                    .on_click(cx.listener(|this, _, _, cx| this.step_brush_width(1, cx))),
            );

        h_flex()
            .gap_4()
            .items_center()
            .child(session_buttons)
            .child(swatches)
            .child(brush)
            .into_any_element()
    }
}
