use std::sync::mpsc;

use pretty_assertions::assert_eq;
use rvdbg_core::Cpu;
use rvdbg_core::common::BusError;
use rvdbg_core::config::{GeneralConfig, SystemConfig};
use rvdbg_core::soc::{MasterId, MemoryTransaction, MemoryTransactionPort, build_bus};

use crate::common::harness::{RAM_BASE, init_tracing};
use crate::common::mocks::{CountingRam, MockPort};

#[test]
fn nb_transport_completes_inline_by_default() {
    let mut bus = build_bus(&SystemConfig::default());
    let (tx, rx) = mpsc::channel();

    bus.nb_transport(
        MemoryTransaction::write(RAM_BASE, 4, 0xcafe_f00d, MasterId::Cpu),
        Box::new(move |t, r| tx.send((t, r)).unwrap()),
    );
    let (trans, result) = rx.try_recv().unwrap();
    assert!(result.is_ok());
    assert!(trans.is_write());

    let (tx, rx) = mpsc::channel();
    bus.nb_transport(
        MemoryTransaction::read(RAM_BASE, 4, MasterId::Debug),
        Box::new(move |t, r| tx.send((t, r)).unwrap()),
    );
    let (trans, result) = rx.try_recv().unwrap();
    assert_eq!(result, Ok(()));
    assert_eq!(trans.rdata, 0xcafe_f00d);
    assert_eq!(trans.source, MasterId::Debug);
}

#[test]
fn nb_transport_reports_errors_through_the_callback() {
    let mut port = MockPort::new();
    port.expect_b_transport()
        .times(1)
        .returning(|t| Err(BusError::Unmapped(t.addr)));
    let (tx, rx) = mpsc::channel();

    port.nb_transport(
        MemoryTransaction::read(0x40, 8, MasterId::Cpu),
        Box::new(move |_, r| tx.send(r).unwrap()),
    );

    assert_eq!(rx.try_recv().unwrap(), Err(BusError::Unmapped(0x40)));
    assert!(port.as_bus_mut().is_none());
}

#[test]
fn debug_master_uses_the_dedicated_debug_port() {
    init_tracing();
    let sys = CountingRam::new(RAM_BASE, 0x100);
    let sys_reads = sys.reads.clone();
    let dbg = CountingRam::new(RAM_BASE, 0x100);
    let dbg_reads = dbg.reads.clone();
    let dbg: Box<dyn MemoryTransactionPort> = Box::new(dbg);
    let mut cpu = Cpu::new(Box::new(sys), Some(dbg), &GeneralConfig::default());

    cpu.debug_write(RAM_BASE, 4, 0x1234).unwrap();
    assert_eq!(cpu.debug_read(RAM_BASE, 4).unwrap(), 0x1234);

    assert_eq!(*dbg_reads.lock().unwrap(), vec![RAM_BASE]);
    assert!(sys_reads.lock().unwrap().is_empty());
    let mut t = MemoryTransaction::read(RAM_BASE, 4, MasterId::Cpu);
    cpu.system_bus().b_transport(&mut t).unwrap();
    assert_eq!(t.rdata, 0);

    let util = cpu.bus_utilization();
    assert_eq!((util[1].writes, util[1].reads), (1, 1));
    assert_eq!((util[0].writes, util[0].reads), (0, 0));
}

#[test]
fn debug_master_falls_back_to_the_system_bus() {
    init_tracing();
    let mut cpu = Cpu::new(
        Box::new(build_bus(&SystemConfig::default())),
        None,
        &GeneralConfig::default(),
    );
    cpu.debug_write(RAM_BASE + 8, 8, u64::MAX).unwrap();
    let mut t = MemoryTransaction::read(RAM_BASE + 8, 8, MasterId::Cpu);
    cpu.system_bus().b_transport(&mut t).unwrap();
    assert_eq!(t.rdata, u64::MAX);
    assert!(cpu.debug_bus().as_bus_mut().is_some());
}
