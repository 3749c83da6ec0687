#[cfg(test)]
mod tests {
    use std::time::Duration;

    use web_time::Instant;

    use crate::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn quadrant() -> Layout {
        Layout::new(Position::new(-1.0, -1.0), Position::new(0.0, 0.0))
    }

    fn laid_out(mut root: Widget, width: f64, height: f64) -> Widget {
        init_logger();
        root.assign_root_ids();
        let mut metrics = FixedPitch::default();
        let mut sizes = CharSizeMap::new();
        root.resize(width, height, &mut metrics, &mut sizes).unwrap();
        root
    }

    /// Fixed-pitch metrics that remember which widgets were painted.
    #[derive(Default)]
    struct Painted {
        metrics: FixedPitch,
        ids: Vec<WidgetId>,
    }

    impl DrawProtocol for Painted {
        fn draw(&mut self, data: &DrawData) -> bool {
            self.ids.push(data.id);
            true
        }

        fn get_text_metrics(
            &mut self,
            bounds: &mut Dimensions,
            char_size: &mut u16,
            data: &DrawData,
            upper_limit: u16,
        ) -> bool {
            self.metrics.get_text_metrics(bounds, char_size, data, upper_limit)
        }
    }

    #[test]
    fn test_fill_panel() {
        let root = laid_out(
            Widget::root().child(Widget::new(WidgetClass::Panel, Layout::fill().thickness(0))),
            1000.0,
            1000.0,
        );
        assert_eq!(
            root.children()[0].rect(),
            Rectangle::new(0.0, 0.0, 1000.0, 1000.0, 0.0)
        );
    }

    #[test]
    fn test_quadrant_with_empty_label() {
        let root = laid_out(
            Widget::root().child(Widget::new(WidgetClass::Panel, quadrant()).label("")),
            1000.0,
            1000.0,
        );
        let panel = &root.children()[0];
        assert_eq!(panel.rect(), Rectangle::new(0.0, 0.0, 500.0, 500.0, 0.0));
        assert_eq!(panel.char_size(), 0);
    }

    fn grouped_labels() -> Widget {
        let cell = || Layout::new(Position::new(-1.0, -1.0), Position::new(-0.5, -0.8));
        Widget::root()
            .child(Widget::new(WidgetClass::Label, cell()).with_text(Text::new("A").group(1)))
            .child(Widget::new(WidgetClass::Label, cell()).with_text(Text::new("ABCDE").group(1)))
    }

    #[test]
    fn test_char_size_group_takes_longest_label() {
        let root = laid_out(grouped_labels(), 400.0, 400.0);
        let a = &root.children()[0];
        let abcde = &root.children()[1];

        assert_eq!(a.rect(), Rectangle::new(0.0, 0.0, 100.0, 40.0, 0.0));
        assert_eq!(abcde.char_size(), 32);
        assert_eq!(a.char_size(), 32);
        assert_eq!(a.text().unwrap().fitted(), 38);
        for w in root.children() {
            assert!(w.char_size() <= w.text().unwrap().fitted());
        }
        assert_eq!(
            abcde.draw_data().label_bounds,
            Rectangle::new(2.0, 4.0, 96.0, 32.0, 0.0)
        );
    }

    #[test]
    fn test_ungrouped_labels_fit_independently() {
        let cell = || Layout::new(Position::new(-1.0, -1.0), Position::new(-0.5, -0.8));
        let root = laid_out(
            Widget::root()
                .child(Widget::new(WidgetClass::Label, cell()).label("A"))
                .child(Widget::new(WidgetClass::Label, cell()).label("ABCDE")),
            400.0,
            400.0,
        );
        assert_eq!(root.children()[0].char_size(), 38);
        assert_eq!(root.children()[1].char_size(), 32);
    }

    #[test]
    fn test_bullet_mark_takes_square() {
        let cell = Layout::new(Position::new(-1.0, -1.0), Position::new(-0.5, -0.8));
        let root = laid_out(
            Widget::root().child(
                Widget::new(WidgetClass::Bullet, cell)
                    .with_text(Text::new("ABCDEFGH").mark(BulletMark::Square, true)),
            ),
            400.0,
            400.0,
        );
        let bullet = &root.children()[0];
        assert_eq!(bullet.char_size(), 16);
        assert_eq!(
            bullet.draw_data().mark_bounds,
            Some(Rectangle::new(1.0, 12.0, 16.0, 16.0, 0.0))
        );
        assert!(bullet.draw_data().label_bounds.ux >= 17.0);
    }

    #[test]
    fn test_modal_dialog_push_and_pop() {
        let mut root = laid_out(
            Widget::root().child(
                Widget::new(WidgetClass::Panel, quadrant())
                    .child(Widget::new(WidgetClass::Label, Layout::fill()).label("x")),
            ),
            1000.0,
            1000.0,
        );
        assert_eq!(root.next_id(), 4);

        let dialog = Widget::new(WidgetClass::Dialog, Layout::centered(0.5, 0.5).thickness(2))
            .child(Widget::new(WidgetClass::Label, Layout::slice(false, -1.0, 0.0)).label("Sure?"))
            .child(Widget::new(WidgetClass::Push, Layout::slice(false, 0.0, 1.0)).label("OK"));
        let nodes = dialog.count() as u32;

        let mut metrics = FixedPitch::default();
        let mut sizes = CharSizeMap::new();
        let first = root.push_dialog(dialog, &mut metrics, &mut sizes).unwrap();
        assert_eq!(first, WidgetId::absolute(4));
        assert_eq!(root.next_id(), 4 + nodes);
        assert!(root.has_modal());

        let top = root.children().last().unwrap();
        assert_eq!(top.rect(), Rectangle::new(250.0, 250.0, 500.0, 500.0, 2.0));
        assert!(top.children()[1].char_size() > 0);

        let second = Widget::new(WidgetClass::Dialog, Layout::centered(0.3, 0.3));
        assert!(matches!(
            root.push_dialog(second, &mut metrics, &mut sizes),
            Err(Error::InvalidDialog(_))
        ));

        let popped = root.pop_dialog(&mut sizes).unwrap();
        assert_eq!(popped.class(), WidgetClass::Dialog);
        assert_eq!(root.next_id(), 4);
        assert!(!root.has_modal());
        assert!(root.pop_dialog(&mut sizes).is_none());
    }

    #[test]
    fn test_push_requires_dialog_class() {
        let mut root = laid_out(Widget::root(), 100.0, 100.0);
        let mut metrics = FixedPitch::default();
        let mut sizes = CharSizeMap::new();
        let panel = Widget::new(WidgetClass::Panel, Layout::fill());
        assert!(matches!(
            root.push_dialog(panel, &mut metrics, &mut sizes),
            Err(Error::InvalidDialog(_))
        ));
    }

    fn sample_tree() -> Widget {
        Widget::root()
            .child(
                Widget::new(WidgetClass::Panel, quadrant())
                    .child(
                        Widget::new(WidgetClass::Label, Layout::slice(false, -1.0, 0.0))
                            .label("Name"),
                    )
                    .child(
                        Widget::new(WidgetClass::Push, Layout::slice(false, 0.0, 1.0))
                            .with_text(Text::new("Go").group(3)),
                    ),
            )
            .child(
                Widget::new(
                    WidgetClass::Push,
                    Layout::new(Position::new(0.0, 0.0), Position::new(1.0, 1.0)),
                )
                .with_text(Text::new("Cancel").group(3)),
            )
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = laid_out(sample_tree(), 800.0, 600.0);
        let b = laid_out(sample_tree(), 800.0, 600.0);
        assert_eq!(a.to_dump(), b.to_dump());
    }

    #[test]
    fn test_layout_is_idempotent() {
        init_logger();
        let mut root = sample_tree();
        root.assign_root_ids();
        let mut metrics = FixedPitch::default();
        let mut sizes = CharSizeMap::new();
        root.layout_root(800.0, 600.0, &mut metrics, &mut sizes).unwrap();
        let first = root.to_dump();
        root.layout_root(800.0, 600.0, &mut metrics, &mut sizes).unwrap();
        assert_eq!(first, root.to_dump());
    }

    #[test]
    fn test_resize_is_stable() {
        let mut root = laid_out(sample_tree(), 800.0, 600.0);
        let mut metrics = FixedPitch::default();
        let mut sizes = CharSizeMap::new();
        root.resize(1024.0, 768.0, &mut metrics, &mut sizes).unwrap();
        let once = root.to_dump();
        root.resize(1024.0, 768.0, &mut metrics, &mut sizes).unwrap();
        assert!(same_dump(&once, &root.to_dump()));
        assert_eq!(sizes.len(), 1);
    }

    #[test]
    fn test_identifiers_are_contiguous() {
        let mut root = sample_tree();
        let next = root.assign_root_ids();
        let mut ids = Vec::new();
        root.for_each(&mut |w| ids.push(w.id().value()));
        ids.sort_unstable();
        let expected: Vec<u32> = (1..next).collect();
        assert_eq!(ids, expected);
        assert_eq!(ids.len(), root.count());
        // Post-order: the root comes last.
        assert_eq!(root.id().value(), next - 1);
    }

    #[test]
    fn test_pin_forces_square() {
        let root = laid_out(
            Widget::root()
                .child(Widget::new(
                    WidgetClass::Panel,
                    Layout::slice(true, 0.8, 1.0).pin(Vertex::UpperRight),
                ))
                .child(Widget::new(
                    WidgetClass::Panel,
                    Layout::slice(true, 0.8, 1.0).pin(Vertex::CenterCenter),
                ))
                .child(Widget::new(WidgetClass::Panel, Layout::fill().pin(Vertex::LowerLeft))),
            1000.0,
            1000.0,
        );
        let rects: Vec<Rectangle> = root.children().iter().map(Widget::rect).collect();
        assert_eq!(rects[0], Rectangle::new(900.0, 0.0, 100.0, 100.0, 0.0));
        assert_eq!(rects[1], Rectangle::new(900.0, 450.0, 100.0, 100.0, 0.0));
        for r in rects {
            assert!((r.width - r.height).abs() <= 1.0);
        }
    }

    #[test]
    fn test_border_scales_with_root() {
        let root = laid_out(
            Widget::root().child(Widget::new(WidgetClass::Panel, Layout::fill().thickness(3))),
            1000.0,
            500.0,
        );
        assert_eq!(root.children()[0].rect().border, 3.0);

        let root = laid_out(
            Widget::root().child(Widget::new(WidgetClass::Panel, Layout::fill().thickness(3))),
            1001.0,
            200.0,
        );
        assert_eq!(root.children()[0].rect().border, 4.0);
    }

    #[test]
    fn test_inner_normalization_follows_parent_border() {
        let root = laid_out(
            Widget::root().child(
                Widget::new(WidgetClass::Panel, Layout::fill().thickness(10))
                    .child(Widget::new(WidgetClass::Panel, Layout::fill().thickness(0)))
                    .child(Widget::new(
                        WidgetClass::Panel,
                        Layout::new(
                            Position::new(-1.0, -1.0).normalize(Normalize::Outer),
                            Position::new(1.0, 1.0).normalize(Normalize::Middle),
                        )
                        .thickness(0),
                    )),
            ),
            1000.0,
            1000.0,
        );
        let outer = &root.children()[0];
        assert_eq!(outer.children()[0].rect(), Rectangle::new(10.0, 10.0, 980.0, 980.0, 0.0));
        assert_eq!(outer.children()[1].rect(), Rectangle::new(0.0, 0.0, 995.0, 995.0, 0.0));
    }

    #[test]
    fn test_forward_sibling_reference_resolves_in_second_pass() {
        let mirror = Layout::new(
            Position::of(-1.0, -1.0, WidgetId::child(1)),
            Position::of(1.0, 1.0, WidgetId::child(1)),
        );
        let root = laid_out(
            Widget::root()
                .child(Widget::new(WidgetClass::Panel, mirror))
                .child(Widget::new(WidgetClass::Panel, quadrant())),
            1000.0,
            1000.0,
        );
        assert_eq!(root.children()[0].rect(), root.children()[1].rect());
    }

    #[test]
    fn test_default_normalization_uses_outer_edge_of_sibling() {
        let over = |norm: Normalize| {
            Layout::new(
                Position::of(-1.0, -1.0, WidgetId::child(0)).normalize(norm),
                Position::of(1.0, 1.0, WidgetId::child(0)).normalize(norm),
            )
            .thickness(0)
        };
        let root = laid_out(
            Widget::root()
                .child(Widget::new(WidgetClass::Panel, quadrant().thickness(10)))
                .child(Widget::new(WidgetClass::Panel, over(Normalize::Default)))
                .child(Widget::new(WidgetClass::Panel, over(Normalize::Inner))),
            1000.0,
            1000.0,
        );
        let framed = root.children()[0].rect();
        assert_eq!(framed.border, 10.0);
        assert_eq!(root.children()[1].rect(), Rectangle::new(0.0, 0.0, 500.0, 500.0, 0.0));
        assert_eq!(root.children()[2].rect(), Rectangle::new(10.0, 10.0, 480.0, 480.0, 0.0));
    }

    #[test]
    fn test_deferred_group_member_fits_resolved_rect() {
        let over = Layout::new(
            Position::of(-1.0, -1.0, WidgetId::child(1)),
            Position::of(1.0, 1.0, WidgetId::child(1)),
        )
        .thickness(0);
        let mut root = laid_out(
            Widget::root()
                .child(Widget::new(WidgetClass::Label, over).with_text(Text::new("Hello").group(1)))
                .child(Widget::new(WidgetClass::Panel, quadrant().thickness(0))),
            400.0,
            400.0,
        );
        // 198 px of interior over five 0.6 em glyphs.
        assert_eq!(root.children()[0].char_size(), 66);

        let mut metrics = FixedPitch::default();
        let mut sizes = CharSizeMap::new();
        root.resize(100.0, 100.0, &mut metrics, &mut sizes).unwrap();
        let label = &root.children()[0];
        assert_eq!(label.rect(), root.children()[1].rect());
        assert_eq!(label.char_size(), 16);
        assert_eq!(label.text().unwrap().fitted(), 16);
        let bounds = label.draw_data().label_bounds;
        assert!(bounds.width <= label.rect().width);
        assert!(bounds.height <= label.rect().height);

        let once = root.to_dump();
        root.resize(100.0, 100.0, &mut metrics, &mut sizes).unwrap();
        assert!(same_dump(&once, &root.to_dump()));
        assert_eq!(sizes.get(GroupKey { scope: root.id(), group: 1 }), Some(16));
    }

    #[test]
    fn test_deferred_member_lowers_its_group() {
        let over = Layout::new(
            Position::of(-1.0, -1.0, WidgetId::child(2)),
            Position::of(1.0, 1.0, WidgetId::child(2)),
        )
        .thickness(0);
        let root = laid_out(
            Widget::root()
                .child(
                    Widget::new(WidgetClass::Label, Layout::slice(false, -1.0, 0.0).thickness(0))
                        .with_text(Text::new("Hi").group(2)),
                )
                .child(Widget::new(WidgetClass::Label, over).with_text(Text::new("Hello").group(2)))
                .child(Widget::new(
                    WidgetClass::Panel,
                    Layout::new(Position::new(0.0, 0.0), Position::new(0.5, 0.5)).thickness(0),
                )),
            400.0,
            400.0,
        );
        // The 100 px square holding "Hello" bounds both members.
        let sizes: Vec<u16> = root.children()[..2].iter().map(Widget::char_size).collect();
        assert_eq!(sizes, [32, 32]);
    }

    #[test]
    fn test_tracked_reference() {
        let tracker = Tracker::new();
        let root = laid_out(
            Widget::root()
                .child(
                    Widget::new(
                        WidgetClass::Panel,
                        Layout::new(Position::new(0.0, 0.0), Position::new(1.0, 1.0)),
                    )
                    .tracker(&tracker),
                )
                .child(Widget::new(
                    WidgetClass::Panel,
                    Layout::new(
                        Position::of(-1.0, -1.0, &tracker),
                        Position::of(0.0, 0.0, &tracker),
                    ),
                )),
            1000.0,
            1000.0,
        );
        assert_eq!(tracker.get(), Some(root.children()[0].id()));
        assert_eq!(
            root.children()[1].rect(),
            Rectangle::new(500.0, 500.0, 250.0, 250.0, 0.0)
        );
    }

    #[test]
    fn test_missing_reference_fails() {
        let mut root = Widget::root().child(Widget::new(
            WidgetClass::Panel,
            Layout::new(
                Position::of(-1.0, -1.0, WidgetId::absolute(99)),
                Position::new(1.0, 1.0),
            ),
        ));
        root.assign_root_ids();
        let err = root
            .resize(100.0, 100.0, &mut FixedPitch::default(), &mut CharSizeMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::BadLayoutReference { .. }));

        let mut selfish = Widget::root().child(Widget::new(
            WidgetClass::Panel,
            Layout::new(Position::of(-1.0, -1.0, WidgetId::child(0)), Position::new(1.0, 1.0)),
        ));
        selfish.assign_root_ids();
        assert!(
            selfish
                .resize(100.0, 100.0, &mut FixedPitch::default(), &mut CharSizeMap::new())
                .is_err()
        );
    }

    #[test]
    fn test_inverted_rectangle_is_skipped() {
        init_logger();
        let mut root = Widget::root()
            .child(
                Widget::new(
                    WidgetClass::Panel,
                    Layout::new(Position::new(0.5, 0.5), Position::new(-0.5, -0.5)),
                )
                .child(Widget::new(WidgetClass::Label, Layout::fill()).label("hidden")),
            )
            .child(Widget::new(WidgetClass::Panel, quadrant()));
        root.assign_root_ids();
        let mut painted = Painted::default();
        root.resize(200.0, 200.0, &mut painted, &mut CharSizeMap::new()).unwrap();

        let inverted = &root.children()[0];
        assert!(!inverted.successful_layout());
        assert!(root.children()[1].successful_layout());

        root.draw(&mut painted).unwrap();
        assert_eq!(painted.ids, vec![root.id(), root.children()[1].id()]);
    }

    #[test]
    fn test_draw_skips_hidden_and_respects_hook() {
        let mut root = Widget::root()
            .child(Widget::new(WidgetClass::Panel, quadrant()).hidden(true))
            .child(
                Widget::new(WidgetClass::Panel, quadrant())
                    .on_draw(|_, _| Ok(false))
                    .child(Widget::new(WidgetClass::Label, Layout::fill())),
            );
        root.assign_root_ids();
        let mut painted = Painted::default();
        root.resize(200.0, 200.0, &mut painted, &mut CharSizeMap::new()).unwrap();
        root.draw(&mut painted).unwrap();
        assert_eq!(painted.ids, vec![root.id()]);
    }

    #[test]
    fn test_clone_refuses_absolute_references() {
        let relative = Widget::new(WidgetClass::Panel, quadrant())
            .child(Widget::new(WidgetClass::Label, Layout::fill()).label("ok"));
        let copy = relative.try_clone().unwrap();
        assert_eq!(copy.count(), 2);
        assert!(!copy.id().is_set());

        let absolute = Widget::new(WidgetClass::Panel, quadrant()).child(Widget::new(
            WidgetClass::Label,
            Layout::new(Position::of(-1.0, -1.0, WidgetId::absolute(3)), Position::new(1.0, 1.0)),
        ));
        assert!(matches!(absolute.try_clone(), Err(Error::InvalidClone { .. })));
    }

    #[test]
    fn test_lookup_relative_and_absolute() {
        let mut root = Widget::root().child(
            Widget::new(WidgetClass::Panel, Layout::fill())
                .child(Widget::new(WidgetClass::Label, quadrant()))
                .child(Widget::new(WidgetClass::Push, quadrant())),
        );
        root.assign_root_ids();
        let panel = root.children()[0].id();
        let label = root.children()[0].children()[0].id();
        let push = root.children()[0].children()[1].id();

        assert_eq!(root.lookup_from(label, WidgetId::PARENT).unwrap().id(), panel);
        assert_eq!(root.lookup_from(panel, WidgetId::child(1)).unwrap().id(), push);
        assert_eq!(root.lookup_from(label, WidgetId::ROOT).unwrap().id(), root.id());
        assert_eq!(root.find(push).unwrap().class(), WidgetClass::Push);
        assert!(matches!(
            root.find(WidgetId::absolute(42)),
            Err(Error::WidgetNotFound(_))
        ));
    }

    #[test]
    fn test_new_child_hook_runs_before_append() {
        let root = Widget::new(WidgetClass::List, Layout::fill())
            .on_new_child(|parent, child| {
                let row = parent.children().len() as f64;
                *child.layout_mut() = Layout::slice(false, -1.0 + 0.5 * row, -0.5 + 0.5 * row);
            })
            .child(Widget::new(WidgetClass::Item, Layout::fill()))
            .child(Widget::new(WidgetClass::Item, Layout::fill()));
        assert_eq!(root.children()[1].layout().upper_left.sy, -0.5);
    }

    #[test]
    fn test_dump_lists_every_widget() {
        let root = laid_out(sample_tree(), 800.0, 600.0);
        let dump = root.to_dump();
        assert!(dump.starts_with("<screen id=\"5\">"));
        assert_eq!(dump.matches("<push ").count(), 2);
        assert!(dump.contains("group=\"3\""));
        assert!(same_dump(&dump, &dump.replace('\n', "  \n")));
    }

    #[test]
    fn test_environment_config() {
        let config: EnvironmentConfig = serde_json::from_str(
            r##"{ "classes": { "item": { "thickness": 7, "fill": "#112233" } },
                  "glyphs": { "up_arrow": "^" } }"##,
        )
        .unwrap();
        let mut env = Environment::default();
        config.apply(&mut env).unwrap();
        assert_eq!(env.defaults(WidgetClass::Item).thickness, 7);
        assert_eq!(
            env.defaults(WidgetClass::Item).options.style().unwrap().fill,
            Color::from_rgb(0x11, 0x22, 0x33)
        );
        assert_eq!(env.glyphs.up_arrow, '^');
        assert_eq!(env.defaults(WidgetClass::Push).thickness, 2);

        let unknown: EnvironmentConfig =
            serde_json::from_str(r#"{ "classes": { "gadget": {} } }"#).unwrap();
        assert!(matches!(
            unknown.apply(&mut env),
            Err(Error::InvalidConfig(_))
        ));
        let thick: EnvironmentConfig =
            serde_json::from_str(r#"{ "classes": { "list": { "thickness": 5000 } } }"#).unwrap();
        assert!(thick.apply(&mut env).is_err());
        assert!(serde_json::from_str::<EnvironmentConfig>(r#"{ "colour": 1 }"#).is_err());
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let mut env = Environment::default();
        let red: EnvironmentConfig =
            serde_json::from_str(r#"{ "classes": { "item": { "fill": "red" } } }"#).unwrap();
        match red.apply(&mut env) {
            Err(Error::InvalidConfig(msg)) => assert!(msg.contains("\"red\"")),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(
            env.defaults(WidgetClass::Item).options.style().unwrap().fill,
            Environment::default().defaults(WidgetClass::Item).options.style().unwrap().fill
        );
        assert_eq!(Color::parse_hex("#11223344"), Some(Color(0x11, 0x22, 0x33, 0x44)));
        assert_eq!(Color::parse_hex("+1+2+3"), None);
        assert_eq!(Color::parse_hex("#12345"), None);
    }

    struct Form {
        base: ScreenBase,
        resets: usize,
        fired: usize,
    }

    impl Form {
        fn new() -> Self {
            let adapter: SharedAdapter =
                std::sync::Arc::new(parking_lot::Mutex::new(FixedPitch::default()));
            Self {
                base: ScreenBase::new("form", adapter),
                resets: 0,
                fired: 0,
            }
        }
    }

    impl Screen for Form {
        fn base(&self) -> &ScreenBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ScreenBase {
            &mut self.base
        }

        fn create_screen_panel(&mut self) -> Widget {
            let entry = Widget::new(WidgetClass::Label, quadrant())
                .label("")
                .on_down_event(|w, at| {
                    if !w.accepts(at) {
                        return None;
                    }
                    let id = w.id();
                    Some(Box::new(move |up: &mut UpEvent<'_>| up.request_focus(id)))
                })
                .on_input(|w, ch| {
                    if ch != '\0' {
                        let text = format!("{}{ch}", w.label_str());
                        w.set_label(text);
                    }
                    true
                });
            Widget::root().child(entry)
        }

        fn reset_widgets(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn test_screen_focus_follows_up_event() {
        let mut form = Form::new();
        form.setup(400.0, 400.0).unwrap();
        let base = form.base_mut();

        let at = Point { x: 10.0, y: 10.0 };
        let up = base.down_event(at).unwrap();
        base.deliver_up(up, at);
        let entry = base.root().children()[0].id();
        assert_eq!(base.focus(), Some(entry));

        assert!(base.input_event('h'));
        assert!(base.input_event('i'));
        assert_eq!(base.widget(entry).unwrap().label_str(), "hi");

        assert!(base.down_event(Point { x: 300.0, y: 300.0 }).is_none());
        base.clear_focus();
        base.clear_focus();
        assert_eq!(base.focus(), None);
        assert!(!base.input_event('x'));
    }

    #[test]
    fn test_screen_dialog_size_is_validated() {
        let mut form = Form::new();
        form.setup(400.0, 400.0).unwrap();
        let err = form
            .base_mut()
            .add_modal_dialog_box(Vec::new(), 0.05, 0.5, -1, None)
            .unwrap_err();
        assert!(err.is_wrapped());
        assert!(matches!(err.root_cause(), Error::InvalidDialogSize { .. }));
        assert!(err.to_string().starts_with("Modal: 'form', dialog size"));

        let id = form
            .base_mut()
            .add_modal_dialog_box(
                vec![Widget::new(WidgetClass::Label, Layout::fill()).label("Saved")],
                0.5,
                0.5,
                2,
                None,
            )
            .unwrap();
        assert!(form.base().root().has_modal());
        assert!(form.base().widget(id).is_ok());
        // Presses outside the dialog go nowhere.
        assert!(form.base_mut().down_event(Point { x: 10.0, y: 10.0 }).is_none());
        assert!(form.base_mut().drop_modal_dialog_box().is_some());
    }

    #[test]
    fn test_timed_event_fires_once() {
        let mut form = Form::new();
        form.setup(400.0, 400.0).unwrap();
        form.set_timed_event(Duration::ZERO, |f: &mut Form| f.fired += 1);
        assert!(form.base().timer_deadline().is_some());

        assert!(fire_due_timer(&mut form, Instant::now()));
        assert!(!fire_due_timer(&mut form, Instant::now()));
        assert_eq!(form.fired, 1);

        form.set_timed_event(Duration::from_secs(60), |f: &mut Form| f.fired += 1);
        assert!(!fire_due_timer(&mut form, Instant::now()));
        Screen::cancel_timed_event(&mut form);
        assert!(form.base().timer_deadline().is_none());
        assert_eq!(form.resets, 0);
    }

    #[test]
    fn test_setup_errors_carry_screen_dump() {
        struct Broken(ScreenBase);

        impl Screen for Broken {
            fn base(&self) -> &ScreenBase {
                &self.0
            }
            fn base_mut(&mut self) -> &mut ScreenBase {
                &mut self.0
            }
            fn create_screen_panel(&mut self) -> Widget {
                Widget::root().child(Widget::new(
                    WidgetClass::Panel,
                    Layout::new(
                        Position::of(-1.0, -1.0, WidgetId::absolute(77)),
                        Position::new(1.0, 1.0),
                    ),
                ))
            }
            fn reset_widgets(&mut self) {}
        }

        let adapter: SharedAdapter =
            std::sync::Arc::new(parking_lot::Mutex::new(FixedPitch::default()));
        let mut broken = Broken(ScreenBase::new("broken", adapter));
        let err = broken.setup(100.0, 100.0).unwrap_err();
        match &err {
            Error::Screen { context, name, dump, .. } => {
                assert_eq!(*context, "Setup");
                assert_eq!(name, "broken");
                assert!(dump.contains("<panel"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(err.root_cause(), Error::BadLayoutReference { .. }));
    }
}
