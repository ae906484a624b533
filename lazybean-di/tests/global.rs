#[cfg(feature = "derive")]
mod global_test {
    use lazybean_di::context::BeanPtr;
    use lazybean_di::func_provider::FuncProviderConfig;
    use lazybean_di::global;
    use lazybean_di::lazy::LazyBean;
    use lazybean_di::settings::ContainerSettings;
    use lazybean_di::{bean_alias, injectable, Bean, Error};
    use std::rc::Rc;

    #[derive(Bean)]
    struct ServiceA {
        #[bean(tag = "path=serviceA.timeout")]
        timeout: i32,
        #[bean(tag = "path=serviceA.credentials")]
        credentials: String,
    }

    #[derive(Bean)]
    struct Parent {
        child: BeanPtr<Child>,
    }

    #[derive(Bean)]
    struct Child {
        parent: LazyBean<Parent>,
    }

    #[injectable]
    trait Clock {
        fn now(&self) -> u64;
    }

    #[derive(Bean)]
    struct FixedClock {
        #[bean(tag = "path=clock.now")]
        now: u64,
    }

    #[bean_alias]
    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.now
        }
    }

    struct Timer {
        clock: BeanPtr<dyn Clock>,
        interval: u64,
    }

    impl lazybean_di::bean::Injectable for Timer {
        fn type_class() -> lazybean_di::bean::TypeClass {
            lazybean_di::bean::TypeClass::Struct
        }
    }

    fn activate() {
        global::use_lazy_context_with(ContainerSettings::default()).unwrap();
    }

    #[test]
    fn should_inject_deferred_value() {
        global::reset();
        global::set_value("serviceA.timeout", 10);
        global::set_value("serviceA.credentials", "{}".to_string());
        activate();

        let service = global::require_bean::<ServiceA>();
        assert_eq!(service.timeout, 10);
        assert_eq!(service.credentials, "{}");
        global::close_context().unwrap();
    }

    #[test]
    fn should_reject_double_activation() {
        global::reset();
        activate();

        assert!(matches!(
            global::use_lazy_context(),
            Err(Error::ContextAlreadyExists)
        ));
    }

    #[test]
    fn should_break_cycle_with_lazy_bean() {
        global::reset();
        activate();

        let parent = global::get_bean::<Parent>().unwrap();
        let resolved = parent.child.parent.require();
        assert!(Rc::ptr_eq(&parent, &resolved));
        assert!(Rc::ptr_eq(
            &global::new_lazy_bean::<Child>().require(),
            &parent.child
        ));
    }

    #[test]
    fn should_resolve_function_provider_arguments() {
        global::reset();
        global::set_value("clock.now", 42u64);
        global::set_bean_provider_fn::<Timer, _, _>(
            |clock: BeanPtr<dyn Clock>, interval: u64| Timer { clock, interval },
            FuncProviderConfig::new().with_default_at(1, 5u64),
        )
        .unwrap();
        activate();

        let timer = global::require_bean::<Timer>();
        assert_eq!(timer.clock.now(), 42);
        assert_eq!(timer.interval, 5);
    }

    #[test]
    fn should_report_missing_function_argument() {
        global::reset();
        activate();
        global::set_bean_provider_fn::<Timer, _, _>(
            |clock: BeanPtr<dyn Clock>, interval: u64| Timer { clock, interval },
            FuncProviderConfig::new().with_value_path_at(1, "timer.interval"),
        )
        .unwrap();
        global::set_value("clock.now", 1u64);

        let error = global::get_bean::<Timer>().err().unwrap();
        assert!(error.to_string().contains("index 1"));
        assert!(error.is_no_injectable_provided());
    }

    #[test]
    fn should_wrap_missing_values() {
        global::reset();
        activate();

        let error = global::get_value::<i32>("missing").unwrap_err();
        assert!(matches!(error, Error::Context { .. }));
        assert!(matches!(error.root_cause(), Error::NoValueFound(_)));
    }

    #[test]
    #[should_panic(expected = "no value found")]
    fn should_panic_on_missing_required_value() {
        global::reset();
        activate();

        global::require_value::<i32>("missing");
    }
}
